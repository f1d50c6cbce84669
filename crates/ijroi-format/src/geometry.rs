//! Points, bounding rectangles and pixel calibration.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RoiError;

/// Relative tolerance of calibrated comparisons.
pub const RTOL: f64 = 1e-5;
/// Absolute tolerance of calibrated comparisons.
pub const ATOL: f64 = 1e-8;

/// `|a - b| <= ATOL + RTOL * |b|`.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned rectangle as a top-left corner plus side lengths.
///
/// Constructors normalize: `top_left` is the component-wise minimum of the
/// corners and `sides` are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoundingRect {
    pub top_left: Point,
    pub sides: Point,
}

impl BoundingRect {
    /// Rectangle spanned by two opposite corners, in either order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let top_left = a.min(b);
        let bottom_right = a.max(b);
        Self {
            top_left,
            sides: Point::new(bottom_right.x - top_left.x, bottom_right.y - top_left.y),
        }
    }

    /// Smallest rectangle enclosing every point. `None` for no points.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (lo, hi) = rest
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self::from_corners(lo, hi))
    }

    /// Rectangle from a corner and signed side lengths.
    #[must_use]
    pub fn from_origin(origin: Point, width: f32, height: f32) -> Self {
        Self::from_corners(origin, origin.offset(width, height))
    }

    /// Re-derive the rectangle from its own corners.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self::from_corners(self.top_left, self.top_left.offset(self.sides.x, self.sides.y))
    }

    #[must_use]
    pub fn left(&self) -> f32 {
        self.top_left.x
    }

    #[must_use]
    pub fn top(&self) -> f32 {
        self.top_left.y
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.top_left.x + self.sides.x
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top_left.y + self.sides.y
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.sides.x
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.sides.y
    }

    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    #[must_use]
    pub fn centroid(&self) -> Point {
        self.top_left.offset(self.sides.x / 2.0, self.sides.y / 2.0)
    }
}

/// Units a calibrated length can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Px,
    Nm,
    Um,
    M,
}

impl LengthUnit {
    /// Nanometres per unit; `None` for pixels.
    #[must_use]
    pub const fn nanometres(self) -> Option<f64> {
        match self {
            Self::Px => None,
            Self::Nm => Some(1.0),
            Self::Um => Some(1e3),
            Self::M => Some(1e9),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Px => "px",
            Self::Nm => "nm",
            Self::Um => "um",
            Self::M => "m",
        };
        f.write_str(name)
    }
}

impl FromStr for LengthUnit {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "px" => Ok(Self::Px),
            "nm" => Ok(Self::Nm),
            "um" | "µm" => Ok(Self::Um),
            "m" => Ok(Self::M),
            other => Err(RoiError::invalid_arguments(format!("unknown unit '{other}'"))),
        }
    }
}

/// Physical size of one pixel.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Calibration {
    nm_per_px: f64,
}

impl Calibration {
    /// Calibration of `nm_per_px` nanometres per pixel.
    ///
    /// `None` unless the value is finite and positive.
    #[must_use]
    pub fn new(nm_per_px: f64) -> Option<Self> {
        (nm_per_px.is_finite() && nm_per_px > 0.0).then_some(Self { nm_per_px })
    }

    /// Derive a calibration from a length measured both physically and in
    /// pixels.
    ///
    /// A zero or non-finite pixel length leaves the calibration unknown.
    #[must_use]
    pub fn from_ratio(physical: f64, unit: LengthUnit, pixels: f64) -> Option<Self> {
        let nm = physical * unit.nanometres()?;
        if pixels == 0.0 || !pixels.is_finite() {
            return None;
        }
        Self::new(nm / pixels)
    }

    #[must_use]
    pub fn nm_per_px(&self) -> f64 {
        self.nm_per_px
    }

    /// Express a pixel length in `unit`.
    #[must_use]
    pub fn from_pixels(&self, px: f64, unit: LengthUnit) -> f64 {
        match unit.nanometres() {
            Some(nm_per_unit) => px * self.nm_per_px / nm_per_unit,
            None => px,
        }
    }

    /// Express a length given in `unit` in pixels.
    #[must_use]
    pub fn to_pixels(&self, value: f64, unit: LengthUnit) -> f64 {
        match unit.nanometres() {
            Some(nm_per_unit) => value * nm_per_unit / self.nm_per_px,
            None => value,
        }
    }
}

impl PartialEq for Calibration {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.nm_per_px, other.nm_per_px)
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nm_per_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_corners_normalizes() {
        let rect = BoundingRect::from_corners(Point::new(30.0, 50.0), Point::new(10.0, 20.0));
        assert_eq!(rect.top_left, Point::new(10.0, 20.0));
        assert_eq!(rect.sides, Point::new(20.0, 30.0));
        assert_eq!(rect.bottom_right(), Point::new(30.0, 50.0));
        assert_eq!(rect.centroid(), Point::new(20.0, 35.0));
    }

    #[test]
    fn test_from_points() {
        let points = [
            Point::new(5.0, 1.0),
            Point::new(-2.0, 4.0),
            Point::new(3.0, 9.0),
        ];
        let rect = BoundingRect::from_points(&points).unwrap();
        assert_eq!(rect.top_left, Point::new(-2.0, 1.0));
        assert_eq!(rect.sides, Point::new(7.0, 8.0));
        assert!(BoundingRect::from_points(&[]).is_none());
    }

    #[test]
    fn test_negative_sides_normalize() {
        let rect = BoundingRect {
            top_left: Point::new(10.0, 10.0),
            sides: Point::new(-4.0, 2.0),
        }
        .normalize();
        assert_eq!(rect.top_left, Point::new(6.0, 10.0));
        assert_eq!(rect.sides, Point::new(4.0, 2.0));
    }

    #[test]
    fn test_calibration_conversion() {
        let cal = Calibration::from_ratio(1.0, LengthUnit::Um, 10.0).unwrap();
        assert!(approx_eq(cal.nm_per_px(), 100.0));
        assert!(approx_eq(cal.from_pixels(5.0, LengthUnit::Nm), 500.0));
        assert!(approx_eq(cal.from_pixels(5.0, LengthUnit::Um), 0.5));
        assert!(approx_eq(cal.to_pixels(0.5, LengthUnit::Um), 5.0));
        assert_eq!(cal.from_pixels(5.0, LengthUnit::Px), 5.0);
    }

    #[test]
    fn test_zero_denominator_is_unknown() {
        assert!(Calibration::from_ratio(1.0, LengthUnit::Um, 0.0).is_none());
        assert!(Calibration::from_ratio(1.0, LengthUnit::Px, 3.0).is_none());
        assert!(Calibration::new(f64::NAN).is_none());
        assert!(Calibration::new(0.0).is_none());
    }

    #[test]
    fn test_calibration_tolerant_equality() {
        let a = Calibration::new(100.0).unwrap();
        let b = Calibration::new(100.0 + 1e-4).unwrap();
        let c = Calibration::new(100.1).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!("um".parse::<LengthUnit>().unwrap(), LengthUnit::Um);
        assert_eq!(LengthUnit::Nm.to_string(), "nm");
        assert!("furlong".parse::<LengthUnit>().is_err());
    }

    fn coord() -> impl Strategy<Value = f32> {
        (-10_000i32..10_000).prop_map(|v| v as f32 / 4.0)
    }

    proptest! {
        #[test]
        fn prop_two_corner_normalize_idempotent(
            ax in coord(), ay in coord(), bx in coord(), by in coord()
        ) {
            let once = BoundingRect::from_corners(Point::new(ax, ay), Point::new(bx, by));
            prop_assert!(once.sides.x >= 0.0 && once.sides.y >= 0.0);
            prop_assert_eq!(once.normalize(), once);
            prop_assert_eq!(once.normalize().normalize(), once.normalize());
        }

        #[test]
        fn prop_four_corner_normalize_idempotent(
            xs in proptest::collection::vec(coord(), 4),
            ys in proptest::collection::vec(coord(), 4),
        ) {
            let points: Vec<Point> = xs.iter().zip(&ys).map(|(x, y)| Point::new(*x, *y)).collect();
            let once = BoundingRect::from_points(&points).unwrap();
            prop_assert!(once.sides.x >= 0.0 && once.sides.y >= 0.0);
            prop_assert_eq!(once.normalize(), once);
        }
    }
}
