//! ImageJ ROI record reader and writer.
//!
//! This crate reads and writes region-of-interest records in the ImageJ
//! binary format, either as single `.roi` files or as zip archives of them
//! (`RoiSet.zip`).
//!
//! # Features
//!
//! - Rectangle, ellipse, polygon, polyline, freehand and text shapes
//! - Subpixel (float) coordinates for format version 222 and later
//! - Key/value property text with provenance lines
//! - Pixel-size calibration and unit conversion
//! - Grouped record names (`group<sep>index`)
//! - Writing one shape kind as another compatible kind
//!
//! # Record layout
//!
//! A record starts with a 64-byte primary header (magic `Iout`, version,
//! type code, bounds, coordinate count, colors, options, `hdr2_offset`),
//! followed by the geometry payload, four zero bytes and a 52-byte secondary
//! header holding the position, the name and property-text locations and the
//! float stroke width. All values are big-endian; text is UTF-16BE.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use ijroi_format::{Point, ReaderOptions, Roi, WriterOptions, read_archive, write_roi_archive};
//!
//! let archive = read_archive(Path::new("RoiSet.zip"), &ReaderOptions::default()).unwrap();
//! for (group, index, roi) in archive.iter() {
//!     println!("{group} {index}: {} with {} points", roi.kind(), roi.points().len());
//! }
//!
//! let square = Roi::polygon(vec![
//!     Point::new(10.0, 10.0),
//!     Point::new(20.0, 10.0),
//!     Point::new(20.0, 20.0),
//!     Point::new(10.0, 20.0),
//! ])
//! .unwrap();
//! write_roi_archive(Path::new("out.zip"), [("square", &square)], WriterOptions::default())
//!     .unwrap();
//! ```

pub mod catalog;
pub mod ellipse;
mod error;
pub mod geometry;
pub mod name;
mod options;
pub mod props;
mod reader;
pub mod shape;
pub mod text;
mod writer;

// Re-export error types
pub use error::{ErrorCategory, Result, RoiError};

// Re-export core types
pub use ellipse::{EllipseFit, EllipseModel, MomentFit};
pub use geometry::{BoundingRect, Calibration, LengthUnit, Point};
pub use name::NameToken;
pub use options::{DEFAULT_ENTRY_PATTERN, EntryCompression, ReaderOptions, WriterOptions};
pub use props::PropertyText;
pub use shape::{Geometry, Roi, ShapeKind};
pub use text::{MonospaceMetrics, TextLabel, TextMetrics};

// Re-export reader functionality
pub use reader::{
    ROI_EXTENSION, RawEntry, ReadReport, RoiArchive, RoiEntry, SkippedEntry, decode_entries,
    read_archive, read_archive_from, read_archives,
};

// Re-export writer functionality
pub use writer::{RoiZipWriter, encode_roi, write_roi_archive};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
