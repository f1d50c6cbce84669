//! Field offsets of the ROI record headers.
//!
//! # Primary header (64 bytes, offset 0)
//!
//! | Offset | Field                 | Type    | Notes                              |
//! |--------|-----------------------|---------|------------------------------------|
//! | 0-3    | magic                 | char[4] | always `Iout`                      |
//! | 4-5    | version               | short   |                                    |
//! | 6      | type                  | byte    | byte 7 unused                      |
//! | 8-15   | top/left/bottom/right | short×4 | integer bounds                     |
//! | 16-17  | n_coordinates         | ushort  |                                    |
//! | 18-33  | x1/y1/x2/y2           | float×4 | float bounds, subpixel only        |
//! | 34-35  | stroke_width          | short   |                                    |
//! | 36-39  | shape_roi_size        | int     |                                    |
//! | 40-43  | stroke_color          | argb    |                                    |
//! | 44-47  | fill_color            | argb    |                                    |
//! | 48-49  | subtype               | short   |                                    |
//! | 50-51  | options               | short   | bit mask                           |
//! | 52-55  | aspect_ratio          | float   | ellipse subtype only               |
//! | 52     | arrow_style/point_type| byte    | aliases aspect_ratio               |
//! | 53     | arrow_head_size       | byte    | aliases aspect_ratio               |
//! | 54-55  | rounded_rect_arc_size | short   | aliases aspect_ratio               |
//! | 56-59  | position              | int     |                                    |
//! | 60-63  | hdr2_offset           | int     | record-relative                    |
//!
//! # Secondary header (52 bytes, offset `hdr2_offset`)
//!
//! | Offset | Field               | Type  |
//! |--------|---------------------|-------|
//! | 4-15   | c / z / t           | int×3 |
//! | 16-19  | name_offset         | int   |
//! | 20-23  | name_length         | int   |
//! | 24-27  | overlay_label_color | argb  |
//! | 28-29  | overlay_font_size   | short |
//! | 30     | group               | byte  |
//! | 31     | image_opacity       | byte  |
//! | 32-35  | image_size          | int   |
//! | 36-39  | float_stroke_width  | float |
//! | 40-43  | roi_props_offset    | int   |
//! | 44-47  | roi_props_length    | int   |
//! | 48-51  | counters_offset     | int   |

use super::field::{Field, FieldType};

/// Primary header fields.
pub mod primary {
    use super::{Field, FieldType};

    pub const MAGIC: Field = Field::new("magic", 0, FieldType::Tag);
    pub const VERSION: Field = Field::new("version", 4, FieldType::I16);
    pub const TYPE: Field = Field::new("type", 6, FieldType::U8);
    pub const TOP: Field = Field::new("top", 8, FieldType::I16);
    pub const LEFT: Field = Field::new("left", 10, FieldType::I16);
    pub const BOTTOM: Field = Field::new("bottom", 12, FieldType::I16);
    pub const RIGHT: Field = Field::new("right", 14, FieldType::I16);
    pub const N_COORDINATES: Field = Field::new("n_coordinates", 16, FieldType::U16);
    pub const X1: Field = Field::new("x1", 18, FieldType::F32);
    pub const Y1: Field = Field::new("y1", 22, FieldType::F32);
    pub const X2: Field = Field::new("x2", 26, FieldType::F32);
    pub const Y2: Field = Field::new("y2", 30, FieldType::F32);
    pub const STROKE_WIDTH: Field = Field::new("stroke_width", 34, FieldType::I16);
    pub const SHAPE_ROI_SIZE: Field = Field::new("shape_roi_size", 36, FieldType::I32);
    pub const STROKE_COLOR: Field = Field::new("stroke_color", 40, FieldType::Color);
    pub const FILL_COLOR: Field = Field::new("fill_color", 44, FieldType::Color);
    pub const SUBTYPE: Field = Field::new("subtype", 48, FieldType::I16);
    pub const OPTIONS: Field = Field::new("options", 50, FieldType::U16);
    pub const ARROW_STYLE: Field = Field::new("arrow_style", 52, FieldType::U8);
    pub const ASPECT_RATIO: Field = Field::new("aspect_ratio", 52, FieldType::F32);
    pub const POINT_TYPE: Field = Field::new("point_type", 52, FieldType::U8);
    pub const ARROW_HEAD_SIZE: Field = Field::new("arrow_head_size", 53, FieldType::U8);
    pub const ROUNDED_RECT_ARC_SIZE: Field =
        Field::new("rounded_rect_arc_size", 54, FieldType::I16);
    pub const POSITION: Field = Field::new("position", 56, FieldType::I32);
    pub const HDR2_OFFSET: Field = Field::new("hdr2_offset", 60, FieldType::I32);

    /// Every primary field in offset order. Aliased slots appear once per name.
    pub const FIELDS: &[Field] = &[
        MAGIC,
        VERSION,
        TYPE,
        TOP,
        LEFT,
        BOTTOM,
        RIGHT,
        N_COORDINATES,
        X1,
        Y1,
        X2,
        Y2,
        STROKE_WIDTH,
        SHAPE_ROI_SIZE,
        STROKE_COLOR,
        FILL_COLOR,
        SUBTYPE,
        OPTIONS,
        ARROW_STYLE,
        ASPECT_RATIO,
        POINT_TYPE,
        ARROW_HEAD_SIZE,
        ROUNDED_RECT_ARC_SIZE,
        POSITION,
        HDR2_OFFSET,
    ];
}

/// Secondary header fields.
pub mod secondary {
    use super::{Field, FieldType};

    pub const C: Field = Field::new("c", 4, FieldType::I32);
    pub const Z: Field = Field::new("z", 8, FieldType::I32);
    pub const T: Field = Field::new("t", 12, FieldType::I32);
    pub const NAME_OFFSET: Field = Field::new("name_offset", 16, FieldType::I32);
    pub const NAME_LENGTH: Field = Field::new("name_length", 20, FieldType::I32);
    pub const OVERLAY_LABEL_COLOR: Field =
        Field::new("overlay_label_color", 24, FieldType::Color);
    pub const OVERLAY_FONT_SIZE: Field = Field::new("overlay_font_size", 28, FieldType::I16);
    pub const GROUP: Field = Field::new("group", 30, FieldType::U8);
    pub const IMAGE_OPACITY: Field = Field::new("image_opacity", 31, FieldType::U8);
    pub const IMAGE_SIZE: Field = Field::new("image_size", 32, FieldType::I32);
    pub const FLOAT_STROKE_WIDTH: Field = Field::new("float_stroke_width", 36, FieldType::F32);
    pub const ROI_PROPS_OFFSET: Field = Field::new("roi_props_offset", 40, FieldType::I32);
    pub const ROI_PROPS_LENGTH: Field = Field::new("roi_props_length", 44, FieldType::I32);
    pub const COUNTERS_OFFSET: Field = Field::new("counters_offset", 48, FieldType::I32);

    /// Every secondary field in offset order.
    pub const FIELDS: &[Field] = &[
        C,
        Z,
        T,
        NAME_OFFSET,
        NAME_LENGTH,
        OVERLAY_LABEL_COLOR,
        OVERLAY_FONT_SIZE,
        GROUP,
        IMAGE_OPACITY,
        IMAGE_SIZE,
        FLOAT_STROKE_WIDTH,
        ROI_PROPS_OFFSET,
        ROI_PROPS_LENGTH,
        COUNTERS_OFFSET,
    ];
}

/// Text-label block at the start of a text record's payload.
pub mod text {
    use super::{Field, FieldType};

    pub const FONT_SIZE: Field = Field::new("font_size", 0, FieldType::I32);
    pub const STYLE: Field = Field::new("style", 4, FieldType::I32);
    pub const FONT_NAME_LENGTH: Field = Field::new("font_name_length", 8, FieldType::I32);
    pub const TEXT_LENGTH: Field = Field::new("text_length", 12, FieldType::I32);

    /// Size of the fixed part of the block; font name and text follow.
    pub const BLOCK_SIZE: usize = 16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HEADER_SIZE, HEADER2_SIZE};

    #[test]
    fn test_fields_fit_records() {
        for field in primary::FIELDS {
            assert!(field.end() <= HEADER_SIZE, "{} overflows", field.name);
        }
        for field in secondary::FIELDS {
            assert!(field.end() <= HEADER2_SIZE, "{} overflows", field.name);
        }
        assert_eq!(primary::HDR2_OFFSET.end(), HEADER_SIZE);
        assert_eq!(secondary::COUNTERS_OFFSET.end(), HEADER2_SIZE);
    }

    #[test]
    fn test_only_documented_aliases_overlap() {
        let aliased = [
            "arrow_style",
            "aspect_ratio",
            "point_type",
            "arrow_head_size",
            "rounded_rect_arc_size",
        ];
        let fields = primary::FIELDS;
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                let overlaps = a.offset < b.end() && b.offset < a.end();
                if overlaps {
                    assert!(
                        aliased.contains(&a.name) && aliased.contains(&b.name),
                        "{} overlaps {}",
                        a.name,
                        b.name
                    );
                }
            }
        }
    }
}
