//! Encode/decode round trips for every shape kind.
//!
//! Each shape is encoded into a single record, decoded through the archive
//! decoder and compared with the original.

use chrono::NaiveDate;
use ijroi_format::catalog::{HEADER_SIZE, PrimaryHeader, RoiType, Subtype};
use ijroi_format::{
    BoundingRect, EllipseModel, LengthUnit, MomentFit, MonospaceMetrics, Point, RawEntry,
    ReaderOptions, Roi, ShapeKind, TextLabel, WriterOptions, decode_entries, encode_roi,
};

fn writer_options() -> WriterOptions {
    WriterOptions::new().with_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
}

fn encode(roi: &Roi, as_kind: Option<ShapeKind>) -> Vec<u8> {
    encode_roi(roi, "shape", None, as_kind, &writer_options()).expect("encode failed")
}

fn decode(data: Vec<u8>) -> Roi {
    let archive = decode_entries(
        "test",
        vec![RawEntry::new("shape.roi", data)],
        &ReaderOptions::default().sequential(),
    );
    assert!(
        archive.report.skipped.is_empty(),
        "unexpected skips: {:?}",
        archive.report.skipped
    );
    archive.get("shape", "").expect("shape missing").clone()
}

fn roundtrip(roi: &Roi) -> Roi {
    decode(encode(roi, None))
}

fn primary_of(data: &[u8]) -> PrimaryHeader {
    PrimaryHeader::parse(data[..HEADER_SIZE].try_into().unwrap())
}

fn square(origin: f32, side: f32) -> Vec<Point> {
    vec![
        Point::new(origin, origin),
        Point::new(origin + side, origin),
        Point::new(origin + side, origin + side),
        Point::new(origin, origin + side),
    ]
}

#[test]
fn test_rectangle_roundtrip() {
    let roi = Roi::rectangle(Point::new(10.0, 20.0), Point::new(30.0, 50.0));
    let data = encode(&roi, None);

    let primary = primary_of(&data);
    assert_eq!(primary.top, 20);
    assert_eq!(primary.left, 10);
    assert_eq!(primary.bottom, 50);
    assert_eq!(primary.right, 30);
    assert_eq!(primary.n_coordinates, 0);
    // Empty payload: the pad follows the header directly.
    assert_eq!(primary.hdr2_offset, 68);

    assert_eq!(decode(data), roi);
}

#[test]
fn test_polygon_offsets_and_roundtrip() {
    let points = vec![
        Point::new(10.0, 10.0),
        Point::new(15.0, 10.0),
        Point::new(15.0, 15.0),
    ];
    let roi = Roi::polygon(points.clone()).unwrap();
    let data = encode(&roi, None);

    let primary = primary_of(&data);
    assert_eq!(primary.roi_type, RoiType::Polygon.code());
    assert_eq!(primary.n_coordinates, 3);
    let xs: Vec<i16> = (0..3)
        .map(|i| i16::from_be_bytes([data[64 + 2 * i], data[65 + 2 * i]]))
        .collect();
    let ys: Vec<i16> = (0..3)
        .map(|i| i16::from_be_bytes([data[70 + 2 * i], data[71 + 2 * i]]))
        .collect();
    assert_eq!(xs, vec![0, 5, 5]);
    assert_eq!(ys, vec![0, 0, 5]);

    let decoded = decode(data);
    assert_eq!(decoded.points().as_ref(), points.as_slice());
    assert_eq!(decoded, roi);
}

#[test]
fn test_point_bearing_kinds_roundtrip() {
    let shapes = vec![
        Roi::polyline(square(3.0, 7.0)).unwrap(),
        Roi::free_line(square(3.0, 7.0)).unwrap(),
        Roi::free_hand(square(3.0, 7.0)).unwrap(),
    ];
    for roi in shapes {
        let decoded = roundtrip(&roi);
        assert_eq!(decoded.kind(), roi.kind());
        assert_eq!(decoded, roi);
    }
}

#[test]
fn test_subpixel_roundtrip_is_exact() {
    let points = vec![
        Point::new(1.25, 2.5),
        Point::new(8.75, 2.0),
        Point::new(6.125, 9.875),
    ];
    let roi = Roi::free_hand(points.clone()).unwrap();
    assert!(roi.is_subpixel());

    let decoded = roundtrip(&roi);
    assert!(decoded.is_subpixel());
    assert_eq!(decoded.points().as_ref(), points.as_slice());
    assert_eq!(decoded.bounding_rect(), roi.bounding_rect());
    assert_eq!(decoded, roi);
}

#[test]
fn test_ellipse_roundtrip() {
    let model = EllipseModel::from_center_axes(Point::new(50.0, 40.0), 20.0, 10.0, 0.3).unwrap();
    let roi = Roi::ellipse_from_model(&model).unwrap();
    let data = encode(&roi, None);

    let primary = primary_of(&data);
    assert_eq!(primary.roi_type, RoiType::FreeHand.code());
    assert_eq!(primary.subtype, Subtype::Ellipse.code());
    assert!((primary.aspect_ratio - 0.5).abs() < 1e-6);

    let decoded = decode(data);
    assert_eq!(decoded.kind(), ShapeKind::Ellipse);
    assert_eq!(decoded.n_coordinates(), roi.n_coordinates());
    assert_eq!(decoded, roi);
}

#[test]
fn test_fitted_ellipse_roundtrip() {
    let model = EllipseModel::from_center_axes(Point::new(30.0, 30.0), 9.0, 4.0, 0.0).unwrap();
    let control = model.sample(3.0).unwrap();
    let roi = Roi::ellipse_from_points(&control, &MomentFit).unwrap();
    assert_eq!(roundtrip(&roi), roi);
}

#[test]
fn test_oval_roundtrip() {
    let rect = BoundingRect::from_corners(Point::new(4.0, 6.0), Point::new(24.0, 16.0));
    let roi = Roi::ellipse_from_bounding_rect(rect).unwrap();
    let data = encode(&roi, None);
    assert_eq!(primary_of(&data).roi_type, RoiType::Oval.code());

    let decoded = decode(data);
    assert_eq!(decoded.kind(), ShapeKind::Ellipse);
    assert_eq!(decoded.aspect_ratio(), Some(0.5));
    assert_eq!(decoded, roi);
}

#[test]
fn test_text_roundtrip() {
    let label = TextLabel::new("cells", 10).with_font("Helvetica").with_style(1);
    let roi = Roi::text(label.clone(), Point::new(12.0, 8.0), &MonospaceMetrics).unwrap();
    let decoded = roundtrip(&roi);
    assert_eq!(decoded.kind(), ShapeKind::Text);
    assert_eq!(decoded.text_label(), Some(&label));
    assert_eq!(decoded, roi);
}

#[test]
fn test_attributes_roundtrip() {
    let mut roi = Roi::polyline(square(0.0, 12.0))
        .unwrap()
        .with_position(1, 4, 2)
        .with_stack_position(9)
        .with_props([("cell", "17"), ("note", "dividing")].into_iter().collect());
    roi.set_spline_fit(true).unwrap();
    roi.set_stroke_color((255, 0, 128, 255));
    roi.set_fill_color((64, 10, 20, 30));
    roi.set_stroke_width(3.0);
    roi.calibrate(250.0).unwrap();

    let decoded = roundtrip(&roi);
    assert_eq!(decoded.position(), (1, 4, 2));
    assert!(decoded.spline_fit());
    assert_eq!(decoded.stroke_width(), 3.0);
    assert_eq!(decoded.props().get("note"), Some("dividing"));
    assert_eq!(decoded.calibration(), roi.calibration());
    let rect = decoded.bounding_rect_in(LengthUnit::Um).unwrap();
    assert!((rect[2] - 3.0).abs() < 1e-9);
    assert_eq!(decoded, roi);
}

#[test]
fn test_property_text_regenerated() {
    let roi = Roi::rectangle(Point::new(0.0, 0.0), Point::new(5.0, 5.0))
        .with_props([("cell", "1")].into_iter().collect());
    let data = encode_roi(&roi, "r", Some("stack.tif"), None, &writer_options()).unwrap();
    let first = decode(data);
    assert_eq!(first.props().get("YYYYMMDD"), Some("20240301"));
    assert_eq!(first.props().image_name(), Some("stack.tif"));

    // A second pass does not accumulate provenance lines.
    let second = decode(encode(&first, None));
    assert_eq!(second.props().user_entries().count(), 1);
    assert_eq!(second.props().image_name(), Some("stack.tif"));
}

#[test]
fn test_encode_as_compatible_kind() {
    let polygon = Roi::polygon(square(2.0, 6.0)).unwrap();
    let as_line = decode(encode(&polygon, Some(ShapeKind::Polyline)));
    assert_eq!(as_line.kind(), ShapeKind::Polyline);
    assert_eq!(as_line.points(), polygon.points());

    let model = EllipseModel::from_center_axes(Point::new(20.0, 20.0), 8.0, 5.0, 0.0).unwrap();
    let ellipse = Roi::ellipse_from_model(&model).unwrap();
    let as_polygon = decode(encode(&ellipse, Some(ShapeKind::Polygon)));
    assert_eq!(as_polygon.kind(), ShapeKind::Polygon);
    assert_eq!(as_polygon.params().subtype, Subtype::None);
    assert_eq!(as_polygon.points(), ellipse.points());

    let as_rect = decode(encode(&ellipse, Some(ShapeKind::Rectangle)));
    assert_eq!(as_rect.kind(), ShapeKind::Rectangle);
    let (got, want) = (as_rect.bounding_rect(), ellipse.bounding_rect());
    assert_eq!(got.top_left, want.top_left);
    assert!((got.width() - want.width()).abs() < 1e-4);
    assert!((got.height() - want.height()).abs() < 1e-4);
}

#[test]
fn test_incompatible_encode_as_fails() {
    let polygon = Roi::polygon(square(2.0, 6.0)).unwrap();
    for target in [ShapeKind::Text, ShapeKind::Rectangle, ShapeKind::Ellipse] {
        assert!(
            encode_roi(&polygon, "p", None, Some(target), &writer_options()).is_err(),
            "polygon should not encode as {target}"
        );
    }
}

#[test]
fn test_coordinate_count_matches_payload() {
    for roi in [
        Roi::polygon(square(0.0, 4.0)).unwrap(),
        Roi::free_hand(vec![
            Point::new(0.5, 0.5),
            Point::new(3.5, 0.5),
            Point::new(2.0, 3.0),
        ])
        .unwrap(),
    ] {
        let data = encode(&roi, None);
        let primary = primary_of(&data);
        let per_point = if roi.is_subpixel() { 12 } else { 4 };
        let payload = primary.hdr2_offset as usize - HEADER_SIZE - 4;
        assert_eq!(usize::from(primary.n_coordinates), roi.n_coordinates());
        assert_eq!(payload, roi.n_coordinates() * per_point);
    }
}
