//! Which shape kinds may be encoded as which other kinds.
//!
//! Encoding a shape as a compatible kind substitutes the target's type code,
//! zeroes the target's skipped select-fields and uses the target's payload
//! encoder.

use super::ShapeKind;
use crate::catalog::SelectField;
use crate::error::{Result, RoiError};

/// One row of the table: shapes of kind `accepts` may be written as `target`.
#[derive(Debug, Clone, Copy)]
pub struct Compatibility {
    pub target: ShapeKind,
    pub accepts: &'static [ShapeKind],
    pub skipped: &'static [SelectField],
}

const POINT_BEARING_SKIPPED: &[SelectField] = &[SelectField::Subtype, SelectField::AspectRatio];

pub const TABLE: [Compatibility; 7] = [
    Compatibility {
        target: ShapeKind::Rectangle,
        accepts: &[ShapeKind::Ellipse],
        skipped: &[
            SelectField::Subtype,
            SelectField::AspectRatio,
            SelectField::PointType,
            SelectField::Position,
            SelectField::FloatStrokeWidth,
        ],
    },
    Compatibility {
        target: ShapeKind::Ellipse,
        accepts: &[],
        skipped: &[
            SelectField::PointType,
            SelectField::Position,
            SelectField::FloatStrokeWidth,
        ],
    },
    Compatibility {
        target: ShapeKind::Polygon,
        accepts: &[
            ShapeKind::Polyline,
            ShapeKind::FreeLine,
            ShapeKind::FreeHand,
            ShapeKind::Ellipse,
        ],
        skipped: POINT_BEARING_SKIPPED,
    },
    Compatibility {
        target: ShapeKind::Polyline,
        accepts: &[
            ShapeKind::Polygon,
            ShapeKind::FreeLine,
            ShapeKind::FreeHand,
            ShapeKind::Ellipse,
        ],
        skipped: POINT_BEARING_SKIPPED,
    },
    Compatibility {
        target: ShapeKind::FreeLine,
        accepts: &[
            ShapeKind::Polygon,
            ShapeKind::Polyline,
            ShapeKind::FreeHand,
            ShapeKind::Ellipse,
        ],
        skipped: POINT_BEARING_SKIPPED,
    },
    Compatibility {
        target: ShapeKind::FreeHand,
        accepts: &[
            ShapeKind::Polygon,
            ShapeKind::Polyline,
            ShapeKind::FreeLine,
            ShapeKind::Ellipse,
        ],
        skipped: POINT_BEARING_SKIPPED,
    },
    Compatibility {
        target: ShapeKind::Text,
        accepts: &[],
        skipped: &[],
    },
];

/// Table row for `target`.
#[must_use]
pub fn lookup(target: ShapeKind) -> &'static Compatibility {
    match target {
        ShapeKind::Rectangle => &TABLE[0],
        ShapeKind::Ellipse => &TABLE[1],
        ShapeKind::Polygon => &TABLE[2],
        ShapeKind::Polyline => &TABLE[3],
        ShapeKind::FreeLine => &TABLE[4],
        ShapeKind::FreeHand => &TABLE[5],
        ShapeKind::Text => &TABLE[6],
    }
}

/// Fields to zero when writing a `source` shape as `target`.
///
/// Writing a shape as its own kind skips nothing.
pub fn skipped_fields(source: ShapeKind, target: ShapeKind) -> Result<&'static [SelectField]> {
    if source == target {
        return Ok(&[]);
    }
    let row = lookup(target);
    if row.accepts.contains(&source) {
        Ok(row.skipped)
    } else {
        Err(RoiError::Incompatible {
            source_kind: source,
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_row() {
        for kind in ShapeKind::ALL {
            assert_eq!(lookup(kind).target, kind);
        }
    }

    #[test]
    fn test_same_kind_skips_nothing() {
        for kind in ShapeKind::ALL {
            assert!(skipped_fields(kind, kind).unwrap().is_empty());
        }
    }

    #[test]
    fn test_ellipse_as_rectangle() {
        let skipped = skipped_fields(ShapeKind::Ellipse, ShapeKind::Rectangle).unwrap();
        assert!(skipped.contains(&SelectField::Subtype));
        assert!(skipped.contains(&SelectField::AspectRatio));
    }

    #[test]
    fn test_polygon_family_interchangeable() {
        assert!(skipped_fields(ShapeKind::Polygon, ShapeKind::FreeHand).is_ok());
        assert!(skipped_fields(ShapeKind::Polyline, ShapeKind::Polygon).is_ok());
        assert!(skipped_fields(ShapeKind::Ellipse, ShapeKind::Polyline).is_ok());
    }

    #[test]
    fn test_incompatible_pairs() {
        let err = skipped_fields(ShapeKind::Polygon, ShapeKind::Text).unwrap_err();
        assert!(matches!(err, RoiError::Incompatible { .. }));
        assert!(skipped_fields(ShapeKind::Rectangle, ShapeKind::Polygon).is_err());
        assert!(skipped_fields(ShapeKind::Text, ShapeKind::Rectangle).is_err());
        assert!(skipped_fields(ShapeKind::Polygon, ShapeKind::Ellipse).is_err());
    }
}
