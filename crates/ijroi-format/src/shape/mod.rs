//! The shape model.
//!
//! A [`Roi`] holds the fields common to every shape directly and a
//! [`Geometry`] branch per shape kind. Shapes come either from a decoded
//! record ([`Roi::from_record`]) or from the constructors below.
//!
//! Coordinates are image pixels. A shape is subpixel when its coordinates are
//! stored as floats; constructors turn subpixel on when any coordinate is
//! fractional, and [`Roi::with_subpixel`] with `false` snaps the shape to the
//! pixel grid, so the in-memory shape always equals what is stored.

pub mod compat;
pub mod payload;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::catalog::codes::{OPT_SPLINE_FIT, OPT_SUBPIXEL};
use crate::catalog::{
    Color, DEFAULT_VERSION, HEADER_SIZE, PrimaryHeader, RoiType, SUBPIXEL_MIN_VERSION,
    SecondaryHeader, SelectParams, Subtype,
};
use crate::ellipse::{EllipseFit, EllipseModel, MAX_VERTEX_SPACING};
use crate::error::{Result, RoiError};
use crate::geometry::{BoundingRect, Calibration, LengthUnit, Point};
use crate::props::{PIXEL_SIZE_KEY, PropertyText};
use crate::text::{TextLabel, TextMetrics};

/// Shape kinds that can be built, decoded and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Polygon,
    Polyline,
    FreeLine,
    FreeHand,
    Text,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        Self::Rectangle,
        Self::Ellipse,
        Self::Polygon,
        Self::Polyline,
        Self::FreeLine,
        Self::FreeHand,
        Self::Text,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Polygon => "polygon",
            Self::Polyline => "polyline",
            Self::FreeLine => "freeline",
            Self::FreeHand => "freehand",
            Self::Text => "text",
        }
    }

    /// Whether shapes of this kind are always stored as a vertex list.
    #[must_use]
    pub const fn is_point_bearing(self) -> bool {
        matches!(
            self,
            Self::Polygon | Self::Polyline | Self::FreeLine | Self::FreeHand
        )
    }

    /// Pick the kind of a decoded record.
    ///
    /// The ellipse and text subtypes take priority over the type code.
    pub fn from_codes(subtype: Subtype, roi_type: RoiType) -> Result<Self> {
        match subtype {
            Subtype::Ellipse => return Ok(Self::Ellipse),
            Subtype::Text => return Ok(Self::Text),
            _ => {}
        }
        match roi_type {
            RoiType::Rectangle => Ok(Self::Rectangle),
            RoiType::Oval => Ok(Self::Ellipse),
            RoiType::Polygon => Ok(Self::Polygon),
            RoiType::FreeLine => Ok(Self::FreeLine),
            RoiType::Polyline => Ok(Self::Polyline),
            RoiType::FreeHand => Ok(Self::FreeHand),
            other => Err(RoiError::UnknownType { code: other.code() }),
        }
    }

    /// Type code written for this kind. Ellipses with vertices are stored as
    /// freehand curves.
    #[must_use]
    pub const fn roi_type(self, has_points: bool) -> RoiType {
        match self {
            Self::Rectangle | Self::Text => RoiType::Rectangle,
            Self::Ellipse if has_points => RoiType::FreeHand,
            Self::Ellipse => RoiType::Oval,
            Self::Polygon => RoiType::Polygon,
            Self::Polyline => RoiType::Polyline,
            Self::FreeLine => RoiType::FreeLine,
            Self::FreeHand => RoiType::FreeHand,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RoiError::invalid_arguments(format!("unknown shape kind '{s}'")))
    }
}

/// Kind-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Rectangle,
    /// Vertices are empty for an oval stored by its bounds alone.
    Ellipse { points: Vec<Point> },
    Polygon { points: Vec<Point> },
    Polyline { points: Vec<Point> },
    #[serde(rename = "freeline")]
    FreeLine { points: Vec<Point> },
    #[serde(rename = "freehand")]
    FreeHand { points: Vec<Point> },
    Text { label: TextLabel },
}

impl Geometry {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle => ShapeKind::Rectangle,
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Polyline { .. } => ShapeKind::Polyline,
            Self::FreeLine { .. } => ShapeKind::FreeLine,
            Self::FreeHand { .. } => ShapeKind::FreeHand,
            Self::Text { .. } => ShapeKind::Text,
        }
    }

    fn with_points(kind: ShapeKind, points: Vec<Point>) -> Self {
        match kind {
            ShapeKind::Polygon => Self::Polygon { points },
            ShapeKind::Polyline => Self::Polyline { points },
            ShapeKind::FreeLine => Self::FreeLine { points },
            ShapeKind::FreeHand => Self::FreeHand { points },
            _ => Self::Ellipse { points },
        }
    }

    /// Vertices stored in the record.
    #[must_use]
    pub fn stored_points(&self) -> &[Point] {
        match self {
            Self::Ellipse { points }
            | Self::Polygon { points }
            | Self::Polyline { points }
            | Self::FreeLine { points }
            | Self::FreeHand { points } => points,
            Self::Rectangle | Self::Text { .. } => &[],
        }
    }

    fn stored_points_mut(&mut self) -> Option<&mut Vec<Point>> {
        match self {
            Self::Ellipse { points }
            | Self::Polygon { points }
            | Self::Polyline { points }
            | Self::FreeLine { points }
            | Self::FreeHand { points } => Some(points),
            Self::Rectangle | Self::Text { .. } => None,
        }
    }
}

/// One region of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roi {
    params: SelectParams,
    bounding_rect: BoundingRect,
    geometry: Geometry,
    props: PropertyText,
    calibration: Option<Calibration>,
}

fn is_fractional(p: &Point) -> bool {
    p.x.fract() != 0.0 || p.y.fract() != 0.0
}

fn snap(p: Point) -> Point {
    Point::new(p.x.round(), p.y.round())
}

fn validate_points(kind: ShapeKind, points: &[Point]) -> Result<()> {
    let minimum = match kind {
        ShapeKind::Polyline | ShapeKind::FreeLine => 2,
        _ => 3,
    };
    if points.len() < minimum {
        return Err(RoiError::invalid_arguments(format!(
            "{kind} needs at least {minimum} points, got {}",
            points.len()
        )));
    }
    if points.len() > usize::from(u16::MAX) {
        return Err(RoiError::invalid_arguments(format!(
            "{kind} has {} points, the format stores at most {}",
            points.len(),
            u16::MAX
        )));
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(RoiError::invalid_arguments(format!(
            "{kind} has a non-finite coordinate"
        )));
    }
    Ok(())
}

impl Roi {
    fn build(roi_type: RoiType, bounding_rect: BoundingRect, geometry: Geometry) -> Self {
        let mut params = SelectParams::new(roi_type);
        let fractional = geometry.stored_points().iter().any(is_fractional)
            || is_fractional(&bounding_rect.top_left)
            || is_fractional(&bounding_rect.sides);
        params.options.set(OPT_SUBPIXEL, fractional);
        Self {
            params,
            bounding_rect,
            geometry,
            props: PropertyText::new(),
            calibration: None,
        }
    }

    /// Rectangle spanned by two opposite corners.
    #[must_use]
    pub fn rectangle(a: Point, b: Point) -> Self {
        Self::build(
            RoiType::Rectangle,
            BoundingRect::from_corners(a, b),
            Geometry::Rectangle,
        )
    }

    fn from_vertices(kind: ShapeKind, points: Vec<Point>) -> Result<Self> {
        validate_points(kind, &points)?;
        let rect = BoundingRect::from_points(&points)
            .ok_or_else(|| RoiError::invalid_arguments("no points"))?;
        Ok(Self::build(
            kind.roi_type(true),
            rect,
            Geometry::with_points(kind, points),
        ))
    }

    /// Closed polygon through `points`.
    pub fn polygon(points: Vec<Point>) -> Result<Self> {
        Self::from_vertices(ShapeKind::Polygon, points)
    }

    /// Open polyline through `points`.
    pub fn polyline(points: Vec<Point>) -> Result<Self> {
        Self::from_vertices(ShapeKind::Polyline, points)
    }

    /// Freehand line through `points`.
    pub fn free_line(points: Vec<Point>) -> Result<Self> {
        Self::from_vertices(ShapeKind::FreeLine, points)
    }

    /// Closed freehand curve through `points`.
    pub fn free_hand(points: Vec<Point>) -> Result<Self> {
        Self::from_vertices(ShapeKind::FreeHand, points)
    }

    /// Ellipse sampled from `model`.
    pub fn ellipse_from_model(model: &EllipseModel) -> Result<Self> {
        let points = model.sample(MAX_VERTEX_SPACING)?;
        validate_points(ShapeKind::Ellipse, &points)?;
        let rect = BoundingRect::from_points(&points)
            .ok_or_else(|| RoiError::invalid_arguments("no points"))?;
        let mut roi = Self::build(RoiType::FreeHand, rect, Geometry::Ellipse { points });
        roi.params.subtype = Subtype::Ellipse;
        roi.params.aspect_ratio = model.aspect_ratio() as f32;
        Ok(roi)
    }

    /// Ellipse fitted to control points.
    pub fn ellipse_from_points(points: &[Point], fit: &dyn EllipseFit) -> Result<Self> {
        Self::ellipse_from_model(&fit.fit(points)?)
    }

    /// Axis-aligned oval filling `rect`, stored by its bounds alone.
    pub fn ellipse_from_bounding_rect(rect: BoundingRect) -> Result<Self> {
        let rect = rect.normalize();
        if !(rect.width() > 0.0 && rect.height() > 0.0) {
            return Err(RoiError::invalid_arguments(
                "oval bounds must have positive width and height",
            ));
        }
        let mut roi = Self::build(
            RoiType::Oval,
            rect,
            Geometry::Ellipse { points: Vec::new() },
        );
        roi.params.subtype = Subtype::Ellipse;
        roi.params.aspect_ratio = rect.width().min(rect.height()) / rect.width().max(rect.height());
        Ok(roi)
    }

    /// Text label with its top-left corner at `top_left`, sized by `metrics`.
    pub fn text(label: TextLabel, top_left: Point, metrics: &dyn TextMetrics) -> Result<Self> {
        if label.font_size <= 0 {
            return Err(RoiError::invalid_arguments(format!(
                "font size must be positive, got {}",
                label.font_size
            )));
        }
        let (width, height) = label.measure(metrics);
        let rect = BoundingRect::from_origin(top_left, width, height);
        let mut roi = Self::build(RoiType::Rectangle, rect, Geometry::Text { label });
        roi.params.subtype = Subtype::Text;
        Ok(roi)
    }

    /// Build a shape from decoded record parts.
    ///
    /// `data` is the whole record; the payload is read from
    /// `HEADER_SIZE..payload_end`. Integer coordinate offsets are translated to
    /// image coordinates here, once.
    pub fn from_record(
        primary: &PrimaryHeader,
        secondary: &SecondaryHeader,
        data: &[u8],
        payload_end: usize,
        props: PropertyText,
    ) -> Result<Self> {
        let mut params = SelectParams::from_headers(primary, secondary)?;
        let kind = ShapeKind::from_codes(params.subtype, params.roi_type)?;
        let subpixel = primary.is_subpixel();

        let mut bounding_rect = if subpixel {
            BoundingRect::from_corners(
                Point::new(primary.x1, primary.y1),
                Point::new(primary.x2, primary.y2),
            )
        } else {
            BoundingRect::from_corners(
                Point::new(f32::from(primary.left), f32::from(primary.top)),
                Point::new(f32::from(primary.right), f32::from(primary.bottom)),
            )
        };

        let geometry = match kind {
            ShapeKind::Rectangle => Geometry::Rectangle,
            ShapeKind::Text => {
                let end = payload_end.min(data.len()).max(HEADER_SIZE);
                let block = data.get(HEADER_SIZE..end).unwrap_or_default();
                Geometry::Text {
                    label: TextLabel::decode(block)?,
                }
            }
            _ => {
                let points = if params.roi_type.is_point_bearing() {
                    payload::decode_points(
                        data,
                        payload_end,
                        usize::from(primary.n_coordinates),
                        subpixel,
                        &bounding_rect,
                    )?
                } else {
                    Vec::new()
                };
                if subpixel && let Some(rect) = BoundingRect::from_points(&points) {
                    bounding_rect = rect;
                }
                Geometry::with_points(kind, points)
            }
        };

        if kind == ShapeKind::Ellipse && params.subtype != Subtype::Ellipse {
            let (w, h) = (bounding_rect.width(), bounding_rect.height());
            params.aspect_ratio = if w > 0.0 && h > 0.0 {
                w.min(h) / w.max(h)
            } else {
                0.0
            };
        }

        let calibration = props
            .get(PIXEL_SIZE_KEY)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .and_then(Calibration::new);

        Ok(Self {
            params,
            bounding_rect,
            geometry,
            props,
            calibration,
        })
    }

    /// Set the channel, slice and frame indices.
    #[must_use]
    pub fn with_position(mut self, c: i32, z: i32, t: i32) -> Self {
        self.params.c = c;
        self.params.z = z;
        self.params.t = t;
        self
    }

    /// Set the stack position.
    #[must_use]
    pub fn with_stack_position(mut self, position: i32) -> Self {
        self.params.position = position;
        self
    }

    /// Replace the property text. A calibration survives the replacement.
    #[must_use]
    pub fn with_props(mut self, props: PropertyText) -> Self {
        self.props = props;
        if let Some(calibration) = self.calibration {
            self.props.insert(PIXEL_SIZE_KEY, calibration.to_string());
        }
        self
    }

    /// Turn subpixel storage on, or snap the shape to the pixel grid.
    #[must_use]
    pub fn with_subpixel(mut self, subpixel: bool) -> Self {
        self.set_subpixel(subpixel);
        self
    }

    /// See [`Roi::with_subpixel`].
    pub fn set_subpixel(&mut self, subpixel: bool) {
        self.params.options.set(OPT_SUBPIXEL, subpixel);
        if subpixel {
            if self.params.version < SUBPIXEL_MIN_VERSION {
                self.params.version = DEFAULT_VERSION;
            }
            self.params.float_stroke_width = f32::from(self.params.stroke_width);
            return;
        }
        self.params.float_stroke_width = 0.0;
        if let Some(points) = self.geometry.stored_points_mut()
            && !points.is_empty()
        {
            for p in points.iter_mut() {
                *p = snap(*p);
            }
            if let Some(rect) = BoundingRect::from_points(points) {
                self.bounding_rect = rect;
            }
            return;
        }
        self.bounding_rect = BoundingRect::from_corners(
            snap(self.bounding_rect.top_left),
            snap(self.bounding_rect.bottom_right()),
        );
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    #[must_use]
    pub fn params(&self) -> &SelectParams {
        &self.params
    }

    #[must_use]
    pub fn bounding_rect(&self) -> BoundingRect {
        self.bounding_rect
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub fn props(&self) -> &PropertyText {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut PropertyText {
        &mut self.props
    }

    #[must_use]
    pub fn is_subpixel(&self) -> bool {
        self.params.is_subpixel()
    }

    #[must_use]
    pub fn position(&self) -> (i32, i32, i32) {
        (self.params.c, self.params.z, self.params.t)
    }

    /// Number of vertices stored in the record.
    #[must_use]
    pub fn n_coordinates(&self) -> usize {
        self.geometry.stored_points().len()
    }

    /// Outline vertices in image coordinates.
    ///
    /// An oval stored by its bounds yields vertices of the inscribed
    /// axis-aligned ellipse. Rectangles and text yield their four corners.
    #[must_use]
    pub fn points(&self) -> Cow<'_, [Point]> {
        let stored = self.geometry.stored_points();
        if !stored.is_empty() {
            return Cow::Borrowed(stored);
        }
        let rect = &self.bounding_rect;
        match self.geometry {
            Geometry::Ellipse { .. } => Cow::Owned(
                EllipseModel::from_bounding_rect(rect)
                    .and_then(|model| model.sample(MAX_VERTEX_SPACING))
                    .unwrap_or_default(),
            ),
            Geometry::Rectangle | Geometry::Text { .. } => Cow::Owned(vec![
                rect.top_left,
                Point::new(rect.right(), rect.top()),
                rect.bottom_right(),
                Point::new(rect.left(), rect.bottom()),
            ]),
            _ => Cow::Borrowed(stored),
        }
    }

    /// Minor/major axis ratio of an ellipse.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f32> {
        (self.kind() == ShapeKind::Ellipse).then_some(self.params.aspect_ratio)
    }

    #[must_use]
    pub fn text_label(&self) -> Option<&TextLabel> {
        match &self.geometry {
            Geometry::Text { label } => Some(label),
            _ => None,
        }
    }

    #[must_use]
    pub fn stroke_color(&self) -> Color {
        self.params.stroke_color
    }

    pub fn set_stroke_color(&mut self, color: impl Into<Color>) {
        self.params.stroke_color = color.into();
    }

    /// Replace the named stroke channels (`alpha`, `red`, `green`, `blue`).
    pub fn update_stroke_color<I, K>(&mut self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, u8)>,
        K: AsRef<str>,
    {
        self.params.stroke_color = self.params.stroke_color.with_channels(channels)?;
        Ok(())
    }

    #[must_use]
    pub fn fill_color(&self) -> Color {
        self.params.fill_color
    }

    pub fn set_fill_color(&mut self, color: impl Into<Color>) {
        self.params.fill_color = color.into();
    }

    /// Replace the named fill channels.
    pub fn update_fill_color<I, K>(&mut self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, u8)>,
        K: AsRef<str>,
    {
        self.params.fill_color = self.params.fill_color.with_channels(channels)?;
        Ok(())
    }

    /// Stroke width; the float field under subpixel storage.
    #[must_use]
    pub fn stroke_width(&self) -> f32 {
        if self.is_subpixel() {
            self.params.float_stroke_width
        } else {
            f32::from(self.params.stroke_width)
        }
    }

    /// Set the stroke width. The integer field is always written; the float
    /// field too under subpixel storage.
    pub fn set_stroke_width(&mut self, width: f32) {
        if self.is_subpixel() {
            self.params.float_stroke_width = width;
        }
        self.params.stroke_width = width.round() as i16;
    }

    /// Whether a polyline is drawn as a fitted spline.
    #[must_use]
    pub fn spline_fit(&self) -> bool {
        self.kind() == ShapeKind::Polyline && self.params.options.contains(OPT_SPLINE_FIT)
    }

    /// Only polylines carry the spline-fit flag.
    pub fn set_spline_fit(&mut self, enabled: bool) -> Result<()> {
        if self.kind() != ShapeKind::Polyline {
            return Err(RoiError::unsupported(format!(
                "spline fit on a {} shape",
                self.kind()
            )));
        }
        self.params.options.set(OPT_SPLINE_FIT, enabled);
        Ok(())
    }

    #[must_use]
    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    /// Attach a physical pixel size. A shape is calibrated at most once.
    pub fn calibrate(&mut self, nm_per_px: f64) -> Result<()> {
        if self.calibration.is_some() {
            return Err(RoiError::AlreadySet {
                field: "pixel size",
            });
        }
        let calibration = Calibration::new(nm_per_px).ok_or_else(|| {
            RoiError::invalid_arguments(format!("invalid pixel size {nm_per_px}"))
        })?;
        self.props.insert(PIXEL_SIZE_KEY, calibration.to_string());
        self.calibration = Some(calibration);
        Ok(())
    }

    /// Bounding rectangle as `[x, y, width, height]` in `unit`.
    #[must_use]
    pub fn bounding_rect_in(&self, unit: LengthUnit) -> Option<[f64; 4]> {
        let cal = self.calibration?;
        let r = &self.bounding_rect;
        Some([r.left(), r.top(), r.width(), r.height()].map(|v| cal.from_pixels(f64::from(v), unit)))
    }

    /// Outline vertices in `unit`.
    #[must_use]
    pub fn points_in(&self, unit: LengthUnit) -> Option<Vec<[f64; 2]>> {
        let cal = self.calibration?;
        Some(
            self.points()
                .iter()
                .map(|p| {
                    [
                        cal.from_pixels(f64::from(p.x), unit),
                        cal.from_pixels(f64::from(p.y), unit),
                    ]
                })
                .collect(),
        )
    }

    /// Geometry payload written between the primary header and the pad.
    pub fn encode_payload(&self) -> Result<Vec<u8>> {
        self.encode_payload_as(self.kind())
    }

    /// Payload for writing this shape as `target`.
    pub(crate) fn encode_payload_as(&self, target: ShapeKind) -> Result<Vec<u8>> {
        let subpixel = self.is_subpixel();
        match target {
            ShapeKind::Rectangle => Ok(Vec::new()),
            ShapeKind::Ellipse => {
                payload::encode_points(self.geometry.stored_points(), &self.bounding_rect, subpixel)
            }
            ShapeKind::Text => match &self.geometry {
                Geometry::Text { label } => label.encode(),
                _ => Err(RoiError::unsupported(format!(
                    "text payload for a {} shape",
                    self.kind()
                ))),
            },
            _ => payload::encode_points(&self.points(), &self.bounding_rect, subpixel),
        }
    }

    /// Vertex count and type code when written as `target`.
    pub(crate) fn stored_layout(&self, target: ShapeKind) -> (usize, RoiType) {
        match target {
            ShapeKind::Ellipse => {
                let n = self.n_coordinates();
                (n, target.roi_type(n > 0))
            }
            kind if kind.is_point_bearing() => (self.points().len(), target.roi_type(true)),
            kind => (0, kind.roi_type(false)),
        }
    }
}
