//! Archive-level reading and writing.
//!
//! Covers zip containers on disk, skipped malformed records, grouped record
//! names and the subpixel version gate.

use std::io::{Cursor, Write};

use chrono::NaiveDate;
use ijroi_format::catalog::{HEADER_SIZE, PrimaryHeader};
use ijroi_format::{
    ErrorCategory, Point, RawEntry, ReaderOptions, Roi, RoiEntry, RoiError, RoiZipWriter,
    WriterOptions, decode_entries, encode_roi, read_archive, read_archive_from, read_archives,
    write_roi_archive,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn writer_options() -> WriterOptions {
    WriterOptions::new().with_date(NaiveDate::from_ymd_opt(2023, 11, 5).unwrap())
}

fn triangle(x: f32) -> Roi {
    Roi::polygon(vec![
        Point::new(x, 0.0),
        Point::new(x + 4.0, 0.0),
        Point::new(x + 2.0, 3.0),
    ])
    .unwrap()
}

fn record(name: &str, roi: &Roi) -> RawEntry {
    let data = encode_roi(roi, name, None, None, &writer_options()).unwrap();
    RawEntry::new(format!("{name}.roi"), data)
}

#[test]
fn test_malformed_magic_is_skipped() {
    let mut bad = record("bad", &triangle(0.0));
    bad.data[..4].copy_from_slice(b"Oops");
    let entries = vec![bad, record("good", &triangle(10.0))];

    let archive = decode_entries("set", entries, &ReaderOptions::default());
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.get("good", ""), Some(&triangle(10.0)));

    let report = &archive.report;
    assert_eq!(report.matched, 2);
    assert_eq!(report.decoded, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].entry, "bad.roi");
    assert_eq!(report.skipped[0].category, ErrorCategory::Format);
}

#[test]
fn test_unknown_type_is_skipped() {
    let mut point = record("point", &triangle(0.0));
    // Type code 10 (point) has no shape.
    point.data[6] = 10;
    let archive = decode_entries(
        "set",
        vec![point, record("kept", &triangle(5.0))],
        &ReaderOptions::default(),
    );
    assert_eq!(archive.len(), 1);
    assert!(archive.report.skipped[0].reason.contains("unknown ROI type"));
}

#[test]
fn test_subpixel_requires_version_222() {
    let roi = Roi::free_hand(vec![
        Point::new(1.25, 1.5),
        Point::new(6.5, 1.75),
        Point::new(3.75, 5.25),
    ])
    .unwrap();
    let mut entry = record("old", &roi);
    entry.data[4..6].copy_from_slice(&221i16.to_be_bytes());

    let primary = PrimaryHeader::parse(entry.data[..HEADER_SIZE].try_into().unwrap());
    assert!(!primary.is_subpixel());

    let archive = decode_entries("set", vec![entry], &ReaderOptions::default());
    let decoded = archive.get("old", "").unwrap();
    assert!(!decoded.is_subpixel());
    assert!(
        decoded
            .points()
            .iter()
            .all(|p| p.x.fract() == 0.0 && p.y.fract() == 0.0)
    );
    assert_eq!(decoded.n_coordinates(), 3);
}

#[test]
fn test_declared_count_beyond_payload() {
    let mut entry = record("short", &triangle(0.0));
    entry.data[16..18].copy_from_slice(&40u16.to_be_bytes());
    let archive = decode_entries("set", vec![entry], &ReaderOptions::default());
    assert!(archive.is_empty());
    assert!(
        archive.report.skipped[0]
            .reason
            .contains("coordinate count mismatch")
    );
}

#[test]
fn test_grouped_names() {
    let options = ReaderOptions::default().with_separator("-");
    let entries = vec![
        record("0001-0001", &triangle(0.0)),
        record("0001-0002", &triangle(10.0)),
        record("0002", &triangle(20.0)),
        record("0002-0007", &triangle(30.0)),
    ];
    let archive = decode_entries("cells", entries, &options);
    assert_eq!(archive.len(), 4);

    match &archive.entries["0001"] {
        RoiEntry::Group(shapes) => {
            assert_eq!(shapes.keys().collect::<Vec<_>>(), vec!["0001", "0002"]);
        }
        other => panic!("expected a group, got {other:?}"),
    }
    // The unindexed record moved under the empty index.
    assert_eq!(archive.get("0002", ""), Some(&triangle(20.0)));
    assert_eq!(archive.get("0002", "0007"), Some(&triangle(30.0)));
}

#[test]
fn test_zip_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("RoiSet.zip");

    let shapes = [("a", triangle(0.0)), ("b", triangle(8.0))];
    let written = write_roi_archive(
        &path,
        shapes.iter().map(|(name, roi)| (*name, roi)),
        writer_options(),
    )
    .unwrap();
    assert_eq!(written, 2);

    let archive = read_archive(&path, &ReaderOptions::default()).unwrap();
    assert_eq!(archive.name, "RoiSet");
    assert_eq!(archive.len(), 2);
    assert_eq!(archive.get("a", ""), Some(&triangle(0.0)));
    assert_eq!(archive.get("b", ""), Some(&triangle(8.0)));
}

#[test]
fn test_append_to_existing_archive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("set.zip");

    let mut writer = RoiZipWriter::create(&path, writer_options()).unwrap();
    writer.write(&triangle(0.0), "first", None, None).unwrap();
    writer.finish().unwrap();

    let mut writer = RoiZipWriter::append(&path, writer_options().stored()).unwrap();
    writer.write(&triangle(5.0), "second.roi", None, None).unwrap();
    writer.finish().unwrap();

    let archive = read_archive(&path, &ReaderOptions::default()).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.get("first", "").is_some());
    assert!(archive.get("second", "").is_some());
}

#[test]
fn test_entry_pattern_filters_names() {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, roi) in [("keep-1.roi", triangle(0.0)), ("skip-1.roi", triangle(3.0))] {
        let data = encode_roi(&roi, name, None, None, &writer_options()).unwrap();
        zip.start_file(name, options).unwrap();
        zip.write_all(&data).unwrap();
    }
    zip.start_file("README.txt", options).unwrap();
    zip.write_all(b"not a record").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let all = read_archive_from(Cursor::new(bytes.clone()), "mem", &ReaderOptions::default())
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.report.matched, 2);

    let filtered = read_archive_from(
        Cursor::new(bytes),
        "mem",
        &ReaderOptions::default().with_pattern(r"^keep.*\.roi$"),
    )
    .unwrap();
    assert_eq!(filtered.len(), 1);
    assert!(filtered.get("keep-1", "").is_some());
}

#[test]
fn test_single_roi_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lone.roi");
    let data = encode_roi(&triangle(2.0), "lone", None, None, &writer_options()).unwrap();
    std::fs::write(&path, data).unwrap();

    let archive = read_archive(&path, &ReaderOptions::default().with_archive_name("single"))
        .unwrap();
    assert_eq!(archive.name, "single");
    assert_eq!(archive.get("lone", ""), Some(&triangle(2.0)));
}

#[test]
fn test_read_many_archives() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("one.zip");
    let second = dir.path().join("two.zip");
    let a = triangle(0.0);
    let b = triangle(1.0);
    write_roi_archive(&first, [("a", &a)], writer_options()).unwrap();
    write_roi_archive(&second, [("b", &b)], writer_options()).unwrap();

    let archives = read_archives(&[first, second], &ReaderOptions::default()).unwrap();
    assert_eq!(archives.keys().collect::<Vec<_>>(), vec!["one", "two"]);
    assert_eq!(archives["two"].get("b", ""), Some(&b));
}

#[test]
fn test_missing_file() {
    let err = read_archive(
        std::path::Path::new("/nonexistent/RoiSet.zip"),
        &ReaderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RoiError::FileNotFound { .. }));
}

#[test]
fn test_invalid_pattern() {
    let err = read_archive_from(
        Cursor::new(Vec::new()),
        "mem",
        &ReaderOptions::default().with_pattern("("),
    )
    .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
}
