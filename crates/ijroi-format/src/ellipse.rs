//! Ellipse model, fitting and arc-length sampling.
//!
//! Ellipse shapes are stored as a closed polyline sampled along the ellipse so
//! that consecutive vertices are at most [`MAX_VERTEX_SPACING`] pixels apart
//! along the arc.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::Serialize;

use crate::error::{Result, RoiError};
use crate::geometry::{BoundingRect, Point};

/// Largest arc length between consecutive sampled vertices, in pixels.
pub const MAX_VERTEX_SPACING: f64 = 0.5;

/// Simpson intervals used for one arc-length integral.
const SIMPSON_INTERVALS: usize = 64;

/// Halvings of the trial step before sampling gives up.
const MAX_HALVINGS: u32 = 32;

/// Ellipse as center, semi-axes and rotation of the major axis (radians,
/// counter-clockwise from +x in image coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EllipseModel {
    pub center_x: f64,
    pub center_y: f64,
    pub semi_major: f64,
    pub semi_minor: f64,
    pub angle: f64,
}

impl EllipseModel {
    /// Model from center, semi-axes and angle.
    ///
    /// The axes may be given in either order; the larger one becomes the
    /// major axis and the angle is turned accordingly.
    pub fn from_center_axes(center: Point, a: f64, b: f64, angle: f64) -> Result<Self> {
        if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0 && angle.is_finite()) {
            return Err(RoiError::invalid_arguments(format!(
                "ellipse axes must be positive, got {a} and {b}"
            )));
        }
        let (semi_major, semi_minor, angle) = if a >= b {
            (a, b, angle)
        } else {
            (b, a, angle + FRAC_PI_2)
        };
        Ok(Self {
            center_x: f64::from(center.x),
            center_y: f64::from(center.y),
            semi_major,
            semi_minor,
            angle: angle.rem_euclid(PI),
        })
    }

    /// Model from the two ends of the major axis and the minor/major ratio.
    pub fn from_axis_endpoints(p1: Point, p2: Point, aspect_ratio: f64) -> Result<Self> {
        if !(aspect_ratio > 0.0 && aspect_ratio <= 1.0) {
            return Err(RoiError::invalid_arguments(format!(
                "aspect ratio must be in (0, 1], got {aspect_ratio}"
            )));
        }
        let dx = f64::from(p2.x) - f64::from(p1.x);
        let dy = f64::from(p2.y) - f64::from(p1.y);
        let center = Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
        let a = dx.hypot(dy) / 2.0;
        Self::from_center_axes(center, a, a * aspect_ratio, dy.atan2(dx))
    }

    /// Axis-aligned ellipse inscribed in `rect`.
    pub fn from_bounding_rect(rect: &BoundingRect) -> Result<Self> {
        Self::from_center_axes(
            rect.centroid(),
            f64::from(rect.width()) / 2.0,
            f64::from(rect.height()) / 2.0,
            0.0,
        )
    }

    /// Minor over major axis length.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.semi_minor / self.semi_major
    }

    /// Point at parameter `t` (radians).
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let (sin_t, cos_t) = t.sin_cos();
        let u = self.semi_major * cos_t;
        let v = self.semi_minor * sin_t;
        Point::new(
            (self.center_x + u * cos_a - v * sin_a) as f32,
            (self.center_y + u * sin_a + v * cos_a) as f32,
        )
    }

    /// `|dP/dt|` at parameter `t`.
    fn speed(&self, t: f64) -> f64 {
        let (sin_t, cos_t) = t.sin_cos();
        (self.semi_major * sin_t).hypot(self.semi_minor * cos_t)
    }

    /// Arc length between parameters `t0` and `t1`, by Simpson's rule.
    #[must_use]
    pub fn arc_length(&self, t0: f64, t1: f64) -> f64 {
        let h = (t1 - t0) / SIMPSON_INTERVALS as f64;
        let mut sum = self.speed(t0) + self.speed(t1);
        for i in 1..SIMPSON_INTERVALS {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * self.speed(t0 + h * i as f64);
        }
        sum * h / 3.0
    }

    /// Largest parameter step whose arc never exceeds `max_spacing`.
    ///
    /// The step is halved from a quarter turn until the arc centered on the
    /// ends of the minor axis, where the ellipse is traversed fastest, is
    /// short enough.
    pub fn angular_step(&self, max_spacing: f64) -> Result<f64> {
        let mut step = FRAC_PI_2;
        for _ in 0..MAX_HALVINGS {
            let arc = self.arc_length(FRAC_PI_2 - step / 2.0, FRAC_PI_2 + step / 2.0);
            if arc <= max_spacing {
                return Ok(step);
            }
            step /= 2.0;
        }
        Err(RoiError::invalid_arguments(format!(
            "ellipse with semi-major axis {} cannot be sampled at {max_spacing} px",
            self.semi_major
        )))
    }

    /// Vertices spaced at most `max_spacing` apart along the arc.
    pub fn sample(&self, max_spacing: f64) -> Result<Vec<Point>> {
        let step = self.angular_step(max_spacing)?;
        let count = (TAU / step).ceil() as usize;
        let step = TAU / count as f64;
        Ok((0..count).map(|i| self.point_at(step * i as f64)).collect())
    }

    /// Tight axis-aligned bounds.
    #[must_use]
    pub fn bounding_rect(&self) -> BoundingRect {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let half_w = (self.semi_major * cos_a).hypot(self.semi_minor * sin_a);
        let half_h = (self.semi_major * sin_a).hypot(self.semi_minor * cos_a);
        BoundingRect::from_corners(
            Point::new((self.center_x - half_w) as f32, (self.center_y - half_h) as f32),
            Point::new((self.center_x + half_w) as f32, (self.center_y + half_h) as f32),
        )
    }
}

/// Fits an ellipse model to control points.
pub trait EllipseFit {
    fn fit(&self, points: &[Point]) -> Result<EllipseModel>;
}

/// Second-moment fit: center at the mean, axes from the eigen decomposition
/// of the covariance.
///
/// Exact for points evenly spaced in the ellipse parameter, such as the
/// vertices of a stored ellipse.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentFit;

impl EllipseFit for MomentFit {
    fn fit(&self, points: &[Point]) -> Result<EllipseModel> {
        if points.len() < 3 {
            return Err(RoiError::invalid_arguments(format!(
                "ellipse fit needs at least 3 points, got {}",
                points.len()
            )));
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| f64::from(p.x)).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| f64::from(p.y)).sum::<f64>() / n;
        let (mut cxx, mut cyy, mut cxy) = (0.0, 0.0, 0.0);
        for p in points {
            let dx = f64::from(p.x) - mean_x;
            let dy = f64::from(p.y) - mean_y;
            cxx += dx * dx;
            cyy += dy * dy;
            cxy += dx * dy;
        }
        cxx /= n;
        cyy /= n;
        cxy /= n;

        let mid = (cxx + cyy) / 2.0;
        let spread = ((cxx - cyy) / 2.0).hypot(cxy);
        let major_var = mid + spread;
        let minor_var = mid - spread;
        if minor_var <= 1e-9 * major_var.max(1.0) {
            return Err(RoiError::invalid_arguments(
                "ellipse control points are collinear",
            ));
        }
        let angle = 0.5 * (2.0 * cxy).atan2(cxx - cyy);
        EllipseModel::from_center_axes(
            Point::new(mean_x as f32, mean_y as f32),
            (2.0 * major_var).sqrt(),
            (2.0 * minor_var).sqrt(),
            angle,
        )
    }
}
