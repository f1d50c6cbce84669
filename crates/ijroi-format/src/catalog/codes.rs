//! Shape-type codes, subtype codes and option bits.

use serde::Serialize;

use crate::error::{Result, RoiError};

/// Shape-type code stored in the primary header `type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RoiType {
    Polygon = 0,
    Rectangle = 1,
    Oval = 2,
    Line = 3,
    FreeLine = 4,
    Polyline = 5,
    NoRoi = 6,
    FreeHand = 7,
    Traced = 8,
    Angle = 9,
    Point = 10,
}

impl RoiType {
    /// Convert from the stored byte.
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Self::Polygon,
            1 => Self::Rectangle,
            2 => Self::Oval,
            3 => Self::Line,
            4 => Self::FreeLine,
            5 => Self::Polyline,
            6 => Self::NoRoi,
            7 => Self::FreeHand,
            8 => Self::Traced,
            9 => Self::Angle,
            10 => Self::Point,
            _ => return Err(RoiError::UnknownType { code }),
        })
    }

    /// Stored byte.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether records of this type carry a coordinate payload.
    #[must_use]
    pub const fn is_point_bearing(self) -> bool {
        matches!(
            self,
            Self::Polygon | Self::FreeLine | Self::Polyline | Self::FreeHand
        )
    }
}

/// Shape subtype stored in the primary header `subtype` short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum Subtype {
    #[default]
    None = 0,
    Text = 1,
    Arrow = 2,
    Ellipse = 3,
    Image = 4,
    RoundedRect = 5,
}

impl Subtype {
    /// Convert from the stored short.
    pub fn from_code(code: i16) -> Result<Self> {
        Ok(match code {
            0 => Self::None,
            1 => Self::Text,
            2 => Self::Arrow,
            3 => Self::Ellipse,
            4 => Self::Image,
            5 => Self::RoundedRect,
            _ => return Err(RoiError::UnknownSubtype { code }),
        })
    }

    /// Stored short.
    #[must_use]
    pub const fn code(self) -> i16 {
        self as i16
    }
}

/// Spline-fit curve.
pub const OPT_SPLINE_FIT: u16 = 1 << 0;
/// Arrow with heads at both ends.
pub const OPT_DOUBLE_HEADED: u16 = 1 << 1;
/// Arrow drawn as outline.
pub const OPT_OUTLINE: u16 = 1 << 2;
/// Overlay shows labels.
pub const OPT_OVERLAY_LABELS: u16 = 1 << 3;
/// Overlay shows names.
pub const OPT_OVERLAY_NAMES: u16 = 1 << 4;
/// Overlay label backgrounds.
pub const OPT_OVERLAY_BACKGROUNDS: u16 = 1 << 5;
/// Overlay labels in bold.
pub const OPT_OVERLAY_BOLD: u16 = 1 << 6;
/// Coordinates stored at subpixel resolution.
pub const OPT_SUBPIXEL: u16 = 1 << 7;
/// Image drawn with offset.
pub const OPT_DRAW_OFFSET: u16 = 1 << 8;
/// Image zero treated as transparent.
pub const OPT_ZERO_TRANSPARENT: u16 = 1 << 9;

/// Option bit mask from the primary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RoiOptions(pub u16);

impl RoiOptions {
    /// Whether every bit in `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    /// Set or clear `flag`.
    pub fn set(&mut self, flag: u16, enabled: bool) {
        if enabled {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Return a copy with `flag` set or cleared.
    #[must_use]
    pub fn with(mut self, flag: u16, enabled: bool) -> Self {
        self.set(flag, enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_type_from_code() {
        let cases = vec![
            (0, RoiType::Polygon),
            (1, RoiType::Rectangle),
            (2, RoiType::Oval),
            (4, RoiType::FreeLine),
            (5, RoiType::Polyline),
            (7, RoiType::FreeHand),
            (10, RoiType::Point),
        ];
        for (code, expected) in cases {
            assert_eq!(RoiType::from_code(code).unwrap(), expected);
            assert_eq!(expected.code(), code);
        }
        assert!(matches!(
            RoiType::from_code(11),
            Err(RoiError::UnknownType { code: 11 })
        ));
    }

    #[test]
    fn test_point_bearing() {
        assert!(RoiType::Polygon.is_point_bearing());
        assert!(RoiType::FreeHand.is_point_bearing());
        assert!(!RoiType::Rectangle.is_point_bearing());
        assert!(!RoiType::Oval.is_point_bearing());
        assert!(!RoiType::Point.is_point_bearing());
    }

    #[test]
    fn test_subtype_from_code() {
        assert_eq!(Subtype::from_code(3).unwrap(), Subtype::Ellipse);
        assert_eq!(Subtype::from_code(1).unwrap(), Subtype::Text);
        assert!(Subtype::from_code(9).is_err());
    }

    #[test]
    fn test_options_bits() {
        let mut options = RoiOptions::default();
        options.set(OPT_SUBPIXEL, true);
        options.set(OPT_SPLINE_FIT, true);
        assert_eq!(options.0, 129);
        assert!(options.contains(OPT_SUBPIXEL));
        options.set(OPT_SPLINE_FIT, false);
        assert!(!options.contains(OPT_SPLINE_FIT));
        assert!(options.contains(OPT_SUBPIXEL));
    }
}
