//! The selectable-field projection of the two headers.
//!
//! A shape owns only the header fields that are meaningful independent of its
//! geometry. Bounds, coordinate counts, names and property offsets are
//! recomputed by the encoder from the shape itself.

use serde::Serialize;

use super::codes::{OPT_SUBPIXEL, RoiOptions, RoiType, Subtype};
use super::color::Color;
use super::header::{PrimaryHeader, SecondaryHeader};
use super::{DEFAULT_VERSION, MAGIC, SUBPIXEL_MIN_VERSION};
use crate::error::Result;

/// Names of the selectable fields, used by the compatible-kind table to
/// declare which fields are zeroed when a shape is encoded as another kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectField {
    StrokeWidth,
    StrokeColor,
    FillColor,
    Subtype,
    Options,
    AspectRatio,
    PointType,
    Position,
    C,
    Z,
    T,
    FloatStrokeWidth,
}

/// Header fields carried by every shape.
#[derive(Debug, Clone, Serialize)]
pub struct SelectParams {
    #[serde(skip)]
    pub magic: [u8; 4],
    pub version: i16,
    pub roi_type: RoiType,
    pub stroke_width: i16,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub subtype: Subtype,
    pub options: RoiOptions,
    pub aspect_ratio: f32,
    pub point_type: u8,
    pub position: i32,
    pub c: i32,
    pub z: i32,
    pub t: i32,
    pub float_stroke_width: f32,
    // Layout fields: informational on decoded shapes, recomputed on encode.
    #[serde(skip)]
    pub hdr2_offset: i32,
    #[serde(skip)]
    pub roi_props_offset: i32,
    #[serde(skip)]
    pub roi_props_length: i32,
    #[serde(skip)]
    pub counters_offset: i32,
}

impl SelectParams {
    /// Fresh projection for a programmatically built shape.
    #[must_use]
    pub fn new(roi_type: RoiType) -> Self {
        Self {
            magic: MAGIC,
            version: DEFAULT_VERSION,
            roi_type,
            stroke_width: 0,
            stroke_color: Color::default(),
            fill_color: Color::default(),
            subtype: Subtype::None,
            options: RoiOptions::default(),
            aspect_ratio: 0.0,
            point_type: 0,
            position: 0,
            c: 0,
            z: 0,
            t: 0,
            float_stroke_width: 0.0,
            hdr2_offset: 0,
            roi_props_offset: 0,
            roi_props_length: 0,
            counters_offset: 0,
        }
    }

    /// Project decoded headers.
    ///
    /// Fails on type and subtype codes outside the catalog.
    pub fn from_headers(primary: &PrimaryHeader, secondary: &SecondaryHeader) -> Result<Self> {
        Ok(Self {
            magic: primary.magic,
            version: primary.version,
            roi_type: RoiType::from_code(primary.roi_type)?,
            stroke_width: primary.stroke_width,
            stroke_color: primary.stroke_color,
            fill_color: primary.fill_color,
            subtype: Subtype::from_code(primary.subtype)?,
            options: primary.options,
            aspect_ratio: primary.aspect_ratio,
            point_type: primary.point_type,
            position: primary.position,
            c: secondary.c,
            z: secondary.z,
            t: secondary.t,
            float_stroke_width: secondary.float_stroke_width,
            hdr2_offset: primary.hdr2_offset,
            roi_props_offset: secondary.roi_props_offset,
            roi_props_length: secondary.roi_props_length,
            counters_offset: secondary.counters_offset,
        })
    }

    /// Copy the projection into header records being built.
    pub fn apply_to(&self, primary: &mut PrimaryHeader, secondary: &mut SecondaryHeader) {
        primary.magic = self.magic;
        primary.version = self.version;
        primary.roi_type = self.roi_type.code();
        primary.stroke_width = self.stroke_width;
        primary.stroke_color = self.stroke_color;
        primary.fill_color = self.fill_color;
        primary.subtype = self.subtype.code();
        primary.options = self.options;
        primary.aspect_ratio = self.aspect_ratio;
        primary.point_type = self.point_type;
        primary.position = self.position;
        primary.hdr2_offset = self.hdr2_offset;
        secondary.c = self.c;
        secondary.z = self.z;
        secondary.t = self.t;
        secondary.float_stroke_width = self.float_stroke_width;
        secondary.roi_props_offset = self.roi_props_offset;
        secondary.roi_props_length = self.roi_props_length;
        secondary.counters_offset = self.counters_offset;
    }

    /// Zero one field.
    pub fn clear(&mut self, field: SelectField) {
        match field {
            SelectField::StrokeWidth => self.stroke_width = 0,
            SelectField::StrokeColor => self.stroke_color = Color::default(),
            SelectField::FillColor => self.fill_color = Color::default(),
            SelectField::Subtype => self.subtype = Subtype::None,
            SelectField::Options => self.options = RoiOptions::default(),
            SelectField::AspectRatio => self.aspect_ratio = 0.0,
            SelectField::PointType => self.point_type = 0,
            SelectField::Position => self.position = 0,
            SelectField::C => self.c = 0,
            SelectField::Z => self.z = 0,
            SelectField::T => self.t = 0,
            SelectField::FloatStrokeWidth => self.float_stroke_width = 0.0,
        }
    }

    /// Whether coordinates are stored at subpixel resolution.
    #[must_use]
    pub fn is_subpixel(&self) -> bool {
        self.options.contains(OPT_SUBPIXEL) && self.version >= SUBPIXEL_MIN_VERSION
    }
}

impl PartialEq for SelectParams {
    fn eq(&self, other: &Self) -> bool {
        self.magic == other.magic
            && self.version == other.version
            && self.roi_type == other.roi_type
            && self.stroke_width == other.stroke_width
            && self.stroke_color == other.stroke_color
            && self.fill_color == other.fill_color
            && self.subtype == other.subtype
            && self.options == other.options
            && self.aspect_ratio == other.aspect_ratio
            && self.point_type == other.point_type
            && self.position == other.position
            && self.c == other.c
            && self.z == other.z
            && self.t == other.t
            && self.float_stroke_width == other.float_stroke_width
    }
}
