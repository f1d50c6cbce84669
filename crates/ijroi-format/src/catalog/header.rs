//! Primary and secondary header records.
//!
//! Both headers are plain value types. [`PrimaryHeader::parse_many`] and
//! [`SecondaryHeader::parse_many`] parse a contiguous run of same-sized records
//! in one pass; the decoder uses them to parse every record of an archive
//! together.

use super::codes::{OPT_SUBPIXEL, RoiOptions, Subtype};
use super::color::Color;
use super::layout::{primary, secondary};
use super::{HEADER_SIZE, HEADER2_SIZE, MAGIC, SUBPIXEL_MIN_VERSION};

/// The 64-byte record at the start of every ROI.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrimaryHeader {
    pub magic: [u8; 4],
    pub version: i16,
    pub roi_type: u8,
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
    pub n_coordinates: u16,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub stroke_width: i16,
    pub shape_roi_size: i32,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub subtype: i16,
    pub options: RoiOptions,
    /// Minor/major axis ratio. Only meaningful for the ellipse subtype.
    pub aspect_ratio: f32,
    /// Point marker type, or arrow style for the arrow subtype.
    pub point_type: u8,
    pub arrow_head_size: u8,
    pub rounded_rect_arc_size: i16,
    pub position: i32,
    pub hdr2_offset: i32,
}

impl PrimaryHeader {
    /// Parse one header from exactly [`HEADER_SIZE`] bytes.
    #[must_use]
    pub fn parse(data: &[u8; HEADER_SIZE]) -> Self {
        let subtype = primary::SUBTYPE.read_i16(data);
        let mut header = Self {
            magic: primary::MAGIC.read_tag(data),
            version: primary::VERSION.read_i16(data),
            roi_type: primary::TYPE.read_u8(data),
            top: primary::TOP.read_i16(data),
            left: primary::LEFT.read_i16(data),
            bottom: primary::BOTTOM.read_i16(data),
            right: primary::RIGHT.read_i16(data),
            n_coordinates: primary::N_COORDINATES.read_u16(data),
            x1: primary::X1.read_f32(data),
            y1: primary::Y1.read_f32(data),
            x2: primary::X2.read_f32(data),
            y2: primary::Y2.read_f32(data),
            stroke_width: primary::STROKE_WIDTH.read_i16(data),
            shape_roi_size: primary::SHAPE_ROI_SIZE.read_i32(data),
            stroke_color: primary::STROKE_COLOR.read_color(data),
            fill_color: primary::FILL_COLOR.read_color(data),
            subtype,
            options: RoiOptions(primary::OPTIONS.read_u16(data)),
            position: primary::POSITION.read_i32(data),
            hdr2_offset: primary::HDR2_OFFSET.read_i32(data),
            ..Self::default()
        };
        // Bytes 52..56 hold either the aspect ratio or the byte-sized fields.
        if subtype == Subtype::Ellipse.code() {
            header.aspect_ratio = primary::ASPECT_RATIO.read_f32(data);
        } else {
            header.point_type = primary::POINT_TYPE.read_u8(data);
            header.arrow_head_size = primary::ARROW_HEAD_SIZE.read_u8(data);
            header.rounded_rect_arc_size = primary::ROUNDED_RECT_ARC_SIZE.read_i16(data);
        }
        header
    }

    /// Parse a contiguous run of headers.
    ///
    /// `data.len()` must be a multiple of [`HEADER_SIZE`]; a trailing partial
    /// record is ignored.
    #[must_use]
    pub fn parse_many(data: &[u8]) -> Vec<Self> {
        data.chunks_exact(HEADER_SIZE)
            .map(|chunk| {
                let mut record = [0u8; HEADER_SIZE];
                record.copy_from_slice(chunk);
                Self::parse(&record)
            })
            .collect()
    }

    /// Build the on-disk record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        primary::MAGIC.write_tag(&mut buf, self.magic);
        primary::VERSION.write_i16(&mut buf, self.version);
        primary::TYPE.write_u8(&mut buf, self.roi_type);
        primary::TOP.write_i16(&mut buf, self.top);
        primary::LEFT.write_i16(&mut buf, self.left);
        primary::BOTTOM.write_i16(&mut buf, self.bottom);
        primary::RIGHT.write_i16(&mut buf, self.right);
        primary::N_COORDINATES.write_u16(&mut buf, self.n_coordinates);
        primary::X1.write_f32(&mut buf, self.x1);
        primary::Y1.write_f32(&mut buf, self.y1);
        primary::X2.write_f32(&mut buf, self.x2);
        primary::Y2.write_f32(&mut buf, self.y2);
        primary::STROKE_WIDTH.write_i16(&mut buf, self.stroke_width);
        primary::SHAPE_ROI_SIZE.write_i32(&mut buf, self.shape_roi_size);
        primary::STROKE_COLOR.write_color(&mut buf, self.stroke_color);
        primary::FILL_COLOR.write_color(&mut buf, self.fill_color);
        primary::SUBTYPE.write_i16(&mut buf, self.subtype);
        primary::OPTIONS.write_u16(&mut buf, self.options.0);
        if self.subtype == Subtype::Ellipse.code() {
            primary::ASPECT_RATIO.write_f32(&mut buf, self.aspect_ratio);
        } else {
            primary::POINT_TYPE.write_u8(&mut buf, self.point_type);
            primary::ARROW_HEAD_SIZE.write_u8(&mut buf, self.arrow_head_size);
            primary::ROUNDED_RECT_ARC_SIZE.write_i16(&mut buf, self.rounded_rect_arc_size);
        }
        primary::POSITION.write_i32(&mut buf, self.position);
        primary::HDR2_OFFSET.write_i32(&mut buf, self.hdr2_offset);
        buf
    }

    /// Whether the magic tag is `Iout`.
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Whether coordinates are stored at subpixel resolution.
    ///
    /// Requires both the subpixel option bit and a format version that
    /// supports it.
    #[must_use]
    pub fn is_subpixel(&self) -> bool {
        self.options.contains(OPT_SUBPIXEL) && self.version >= SUBPIXEL_MIN_VERSION
    }

    /// Arrow style, when this is an arrow record.
    #[must_use]
    pub fn arrow_style(&self) -> Option<u8> {
        (self.subtype == Subtype::Arrow.code()).then_some(self.point_type)
    }
}

/// The 52-byte record located at `hdr2_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SecondaryHeader {
    pub c: i32,
    pub z: i32,
    pub t: i32,
    pub name_offset: i32,
    pub name_length: i32,
    pub overlay_label_color: Color,
    pub overlay_font_size: i16,
    pub group: u8,
    pub image_opacity: u8,
    pub image_size: i32,
    pub float_stroke_width: f32,
    pub roi_props_offset: i32,
    pub roi_props_length: i32,
    pub counters_offset: i32,
}

impl SecondaryHeader {
    /// Parse one header from exactly [`HEADER2_SIZE`] bytes.
    #[must_use]
    pub fn parse(data: &[u8; HEADER2_SIZE]) -> Self {
        Self {
            c: secondary::C.read_i32(data),
            z: secondary::Z.read_i32(data),
            t: secondary::T.read_i32(data),
            name_offset: secondary::NAME_OFFSET.read_i32(data),
            name_length: secondary::NAME_LENGTH.read_i32(data),
            overlay_label_color: secondary::OVERLAY_LABEL_COLOR.read_color(data),
            overlay_font_size: secondary::OVERLAY_FONT_SIZE.read_i16(data),
            group: secondary::GROUP.read_u8(data),
            image_opacity: secondary::IMAGE_OPACITY.read_u8(data),
            image_size: secondary::IMAGE_SIZE.read_i32(data),
            float_stroke_width: secondary::FLOAT_STROKE_WIDTH.read_f32(data),
            roi_props_offset: secondary::ROI_PROPS_OFFSET.read_i32(data),
            roi_props_length: secondary::ROI_PROPS_LENGTH.read_i32(data),
            counters_offset: secondary::COUNTERS_OFFSET.read_i32(data),
        }
    }

    /// Parse a contiguous run of headers.
    #[must_use]
    pub fn parse_many(data: &[u8]) -> Vec<Self> {
        data.chunks_exact(HEADER2_SIZE)
            .map(|chunk| {
                let mut record = [0u8; HEADER2_SIZE];
                record.copy_from_slice(chunk);
                Self::parse(&record)
            })
            .collect()
    }

    /// Build the on-disk record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER2_SIZE] {
        let mut buf = [0u8; HEADER2_SIZE];
        secondary::C.write_i32(&mut buf, self.c);
        secondary::Z.write_i32(&mut buf, self.z);
        secondary::T.write_i32(&mut buf, self.t);
        secondary::NAME_OFFSET.write_i32(&mut buf, self.name_offset);
        secondary::NAME_LENGTH.write_i32(&mut buf, self.name_length);
        secondary::OVERLAY_LABEL_COLOR.write_color(&mut buf, self.overlay_label_color);
        secondary::OVERLAY_FONT_SIZE.write_i16(&mut buf, self.overlay_font_size);
        secondary::GROUP.write_u8(&mut buf, self.group);
        secondary::IMAGE_OPACITY.write_u8(&mut buf, self.image_opacity);
        secondary::IMAGE_SIZE.write_i32(&mut buf, self.image_size);
        secondary::FLOAT_STROKE_WIDTH.write_f32(&mut buf, self.float_stroke_width);
        secondary::ROI_PROPS_OFFSET.write_i32(&mut buf, self.roi_props_offset);
        secondary::ROI_PROPS_LENGTH.write_i32(&mut buf, self.roi_props_length);
        secondary::COUNTERS_OFFSET.write_i32(&mut buf, self.counters_offset);
        buf
    }
}
