//! Coordinate payload codec.
//!
//! The block after the primary header holds `n` 16-bit x offsets, then `n`
//! 16-bit y offsets, both relative to the integer top-left of the bounding
//! rectangle. Subpixel records follow them with `n` absolute f32 x values and
//! `n` absolute f32 y values.

use crate::catalog::HEADER_SIZE;
use crate::error::{Result, RoiError};
use crate::geometry::{BoundingRect, Point};

const INT_POINT_SIZE: usize = 4;
const FLOAT_POINT_SIZE: usize = 8;

/// Bytes per stored point.
#[must_use]
pub const fn point_size(subpixel: bool) -> usize {
    if subpixel {
        INT_POINT_SIZE + FLOAT_POINT_SIZE
    } else {
        INT_POINT_SIZE
    }
}

/// Integer bounds written to the primary header as `(top, left, bottom, right)`.
pub fn integer_bounds(rect: &BoundingRect) -> Result<(i16, i16, i16, i16)> {
    Ok((
        to_i16(rect.top().floor(), "top")?,
        to_i16(rect.left().floor(), "left")?,
        to_i16(rect.bottom().ceil(), "bottom")?,
        to_i16(rect.right().ceil(), "right")?,
    ))
}

fn to_i16(value: f32, what: &str) -> Result<i16> {
    if value.is_finite() && value >= f32::from(i16::MIN) && value <= f32::from(i16::MAX) {
        Ok(value as i16)
    } else {
        Err(RoiError::invalid_arguments(format!(
            "{what} bound {value} does not fit the integer header fields"
        )))
    }
}

/// Encode `points` as a coordinate block.
pub fn encode_points(points: &[Point], rect: &BoundingRect, subpixel: bool) -> Result<Vec<u8>> {
    let origin_x = rect.left().floor();
    let origin_y = rect.top().floor();
    let mut out = Vec::with_capacity(points.len() * point_size(subpixel));
    for p in points {
        out.extend_from_slice(&to_i16((p.x - origin_x).round(), "x offset")?.to_be_bytes());
    }
    for p in points {
        out.extend_from_slice(&to_i16((p.y - origin_y).round(), "y offset")?.to_be_bytes());
    }
    if subpixel {
        for p in points {
            out.extend_from_slice(&p.x.to_be_bytes());
        }
        for p in points {
            out.extend_from_slice(&p.y.to_be_bytes());
        }
    }
    Ok(out)
}

/// Decode `count` points from a record.
///
/// `limit` is the first byte past the payload region. Integer offsets are
/// translated by [`decode_adjust`]; subpixel floats are already absolute.
pub fn decode_points(
    data: &[u8],
    limit: usize,
    count: usize,
    subpixel: bool,
    rect: &BoundingRect,
) -> Result<Vec<Point>> {
    let limit = limit.min(data.len());
    let available = limit.saturating_sub(HEADER_SIZE);
    let per_point = point_size(subpixel);
    if count * per_point > available {
        return Err(RoiError::CoordinateCountMismatch {
            declared: count,
            actual: available / per_point,
        });
    }

    let read_i16 = |at: usize| i16::from_be_bytes([data[at], data[at + 1]]);
    let read_f32 =
        |at: usize| f32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

    let xs = HEADER_SIZE;
    let ys = xs + 2 * count;
    if subpixel {
        let fxs = ys + 2 * count;
        let fys = fxs + 4 * count;
        return Ok((0..count)
            .map(|i| Point::new(read_f32(fxs + 4 * i), read_f32(fys + 4 * i)))
            .collect());
    }
    let raw: Vec<Point> = (0..count)
        .map(|i| {
            Point::new(
                f32::from(read_i16(xs + 2 * i)),
                f32::from(read_i16(ys + 2 * i)),
            )
        })
        .collect();
    Ok(decode_adjust(&raw, rect))
}

/// Translate stored integer offsets into image coordinates by adding the
/// integer top-left of `rect`.
#[must_use]
pub fn decode_adjust(raw: &[Point], rect: &BoundingRect) -> Vec<Point> {
    let dx = rect.left().floor();
    let dy = rect.top().floor();
    raw.iter().map(|p| p.offset(dx, dy)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_offset_adjustment() {
        let raw = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 5.0),
        ];
        let rect = BoundingRect::from_corners(Point::new(10.0, 10.0), Point::new(15.0, 15.0));
        assert_eq!(
            decode_adjust(&raw, &rect),
            vec![
                Point::new(10.0, 10.0),
                Point::new(15.0, 10.0),
                Point::new(15.0, 15.0),
            ]
        );
    }

    #[test]
    fn test_integer_block_layout() {
        let points = [Point::new(12.0, 30.0), Point::new(14.0, 33.0)];
        let rect = BoundingRect::from_points(&points).unwrap();
        let block = encode_points(&points, &rect, false).unwrap();
        assert_eq!(block, vec![0, 0, 0, 2, 0, 0, 0, 3]);

        let data = record_with(&block);
        let decoded = decode_points(&data, data.len(), 2, false, &rect).unwrap();
        assert_eq!(decoded, points);
    }

    #[test]
    fn test_subpixel_block_holds_absolute_floats() {
        let points = [Point::new(1.25, 2.5), Point::new(3.75, 0.5)];
        let rect = BoundingRect::from_points(&points).unwrap();
        let block = encode_points(&points, &rect, true).unwrap();
        assert_eq!(block.len(), 2 * point_size(true));
        assert_eq!(&block[8..12], &1.25f32.to_be_bytes());
        assert_eq!(&block[16..20], &2.5f32.to_be_bytes());

        let data = record_with(&block);
        let decoded = decode_points(&data, data.len(), 2, true, &rect).unwrap();
        assert_eq!(decoded, points);
    }

    #[test]
    fn test_short_payload_is_count_mismatch() {
        let data = record_with(&[0u8; 8]);
        let rect = BoundingRect::default();
        let err = decode_points(&data, data.len(), 3, false, &rect).unwrap_err();
        assert!(matches!(
            err,
            RoiError::CoordinateCountMismatch {
                declared: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_bounds_overflow_rejected() {
        let rect = BoundingRect::from_corners(Point::new(0.0, 0.0), Point::new(40_000.0, 1.0));
        assert!(integer_bounds(&rect).is_err());
    }
}
