//! ROI record encoder and archive writer.
//!
//! A record is laid out as
//!
//! ```text
//! 0                primary header (64 bytes)
//! 64               geometry payload
//! 64 + p           zero pad (4 bytes)
//! hdr2_offset      secondary header (52 bytes)
//! name_offset      record name, UTF-16BE
//! roi_props_offset property text, UTF-16BE
//! ```
//!
//! with `hdr2_offset = 64 + p + 4`.

use std::fs::{File, OpenOptions};
use std::io::{Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::catalog::field::encode_utf16_be;
use crate::catalog::{HEADER_SIZE, HEADER2_SIZE, PAD_LEN, PrimaryHeader, SecondaryHeader};
use crate::error::{Result, RoiError};
use crate::options::{EntryCompression, WriterOptions};
use crate::reader::ROI_EXTENSION;
use crate::shape::payload::integer_bounds;
use crate::shape::{Roi, ShapeKind, compat};

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| RoiError::invalid_arguments(format!("{what} {value} exceeds the format limit")))
}

/// Strip a trailing `.roi` from a record name.
fn record_name(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(ROI_EXTENSION) => stem,
        _ => name,
    }
}

/// Encode one shape as a complete record.
///
/// `as_kind` writes the shape as another compatible kind: the target's type
/// code and payload encoder are used and the target's skipped fields are
/// zeroed. The record name is stored without a `.roi` extension.
pub fn encode_roi(
    roi: &Roi,
    name: &str,
    image_name: Option<&str>,
    as_kind: Option<ShapeKind>,
    options: &WriterOptions,
) -> Result<Vec<u8>> {
    let source = roi.kind();
    let target = as_kind.unwrap_or(source);
    let skipped = compat::skipped_fields(source, target)?;

    let mut params = roi.params().clone();
    for field in skipped {
        params.clear(*field);
    }
    let (n_coordinates, roi_type) = roi.stored_layout(target);
    params.roi_type = roi_type;

    let payload = roi.encode_payload_as(target)?;
    let name = encode_utf16_be(record_name(name));
    let props = roi
        .props()
        .render_for_archive_on(image_name, options.effective_date());

    let hdr2_offset = HEADER_SIZE + payload.len() + PAD_LEN;
    let name_offset = hdr2_offset + HEADER2_SIZE;
    let props_offset = name_offset + name.len();
    let total = props_offset + props.len();
    to_i32(total, "record size")?;

    params.hdr2_offset = to_i32(hdr2_offset, "hdr2_offset")?;
    params.roi_props_offset = to_i32(props_offset, "roi_props_offset")?;
    params.roi_props_length = to_i32(props.len() / 2, "roi_props_length")?;
    params.counters_offset = 0;

    let mut primary = PrimaryHeader::default();
    let mut secondary = SecondaryHeader::default();
    params.apply_to(&mut primary, &mut secondary);

    let rect = roi.bounding_rect();
    (primary.top, primary.left, primary.bottom, primary.right) = integer_bounds(&rect)?;
    if params.is_subpixel() {
        primary.x1 = rect.left();
        primary.y1 = rect.top();
        primary.x2 = rect.right();
        primary.y2 = rect.bottom();
    }
    primary.n_coordinates = u16::try_from(n_coordinates).map_err(|_| {
        RoiError::invalid_arguments(format!(
            "{n_coordinates} coordinates exceed the format limit of {}",
            u16::MAX
        ))
    })?;
    secondary.name_offset = to_i32(name_offset, "name_offset")?;
    secondary.name_length = to_i32(name.len() / 2, "name_length")?;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&primary.to_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&[0u8; PAD_LEN]);
    out.extend_from_slice(&secondary.to_bytes());
    out.extend_from_slice(&name);
    out.extend_from_slice(&props);
    Ok(out)
}

/// Writes shapes into a ROI zip archive, one record per entry.
pub struct RoiZipWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: WriterOptions,
    written: usize,
}

impl<W: Write + Seek> RoiZipWriter<W> {
    /// Start a new archive.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, WriterOptions::default())
    }

    /// Start a new archive with options.
    pub fn with_options(writer: W, options: WriterOptions) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options,
            written: 0,
        }
    }

    fn entry_options(&self) -> SimpleFileOptions {
        let method = match self.options.compression {
            EntryCompression::Deflated => zip::CompressionMethod::Deflated,
            EntryCompression::Stored => zip::CompressionMethod::Stored,
        };
        SimpleFileOptions::default().compression_method(method)
    }

    /// Encode `roi` and add it as entry `name`, appending `.roi` when missing.
    pub fn write(
        &mut self,
        roi: &Roi,
        name: &str,
        image_name: Option<&str>,
        as_kind: Option<ShapeKind>,
    ) -> Result<()> {
        let record = encode_roi(roi, name, image_name, as_kind, &self.options)?;
        self.write_record(name, &record)
    }

    /// Add a record produced by [`encode_roi`] as entry `name`.
    pub fn write_record(&mut self, name: &str, record: &[u8]) -> Result<()> {
        let entry = format!("{}.{ROI_EXTENSION}", record_name(name));
        self.zip.start_file(entry.as_str(), self.entry_options())?;
        self.zip.write_all(record)?;
        self.written += 1;
        debug!(entry = %entry, bytes = record.len(), "wrote ROI record");
        Ok(())
    }

    /// Entries written so far by this writer.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

impl RoiZipWriter<File> {
    /// Create (or truncate) an archive at `path`.
    pub fn create(path: &Path, options: WriterOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_options(file, options))
    }

    /// Open an existing archive at `path` and add entries after its own.
    pub fn append(path: &Path, options: WriterOptions) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RoiError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RoiError::Io(e)
            }
        })?;
        Ok(Self {
            zip: ZipWriter::new_append(file)?,
            options,
            written: 0,
        })
    }
}

/// Write named shapes to a new archive at `path`.
pub fn write_roi_archive<'a, I>(path: &Path, shapes: I, options: WriterOptions) -> Result<usize>
where
    I: IntoIterator<Item = (&'a str, &'a Roi)>,
{
    let mut writer = RoiZipWriter::create(path, options)?;
    for (name, roi) in shapes {
        writer.write(roi, name, None, None)?;
    }
    let written = writer.written();
    writer.finish()?;
    Ok(written)
}
