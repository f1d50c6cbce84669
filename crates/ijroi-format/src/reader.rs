//! ROI archive reader.
//!
//! Decoding runs in two passes. The fixed-size primary headers of every
//! accepted entry are parsed together first, which establishes each record's
//! own `hdr2_offset`. Secondary headers are then sliced from each record's own
//! buffer, and the remaining per-record work (names, property text, geometry)
//! runs independently per record, on the rayon pool by default.
//!
//! Malformed records are skipped and listed in the [`ReadReport`]; the rest of
//! the archive still decodes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::catalog::field::decode_utf16_be;
use crate::catalog::{HEADER_SIZE, HEADER2_SIZE, MAGIC, PrimaryHeader, SecondaryHeader};
use crate::error::{ErrorCategory, Result, RoiError};
use crate::name::NameToken;
use crate::options::ReaderOptions;
use crate::props::PropertyText;
use crate::shape::Roi;

/// File extension of single records and of archive entries.
pub const ROI_EXTENSION: &str = "roi";

/// An archive entry: its name and full content.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl RawEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Shapes stored under one group name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoiEntry {
    /// A record whose name had no index.
    Single(Roi),
    /// Records sharing a group, keyed by index.
    Group(BTreeMap<String, Roi>),
}

impl RoiEntry {
    /// Number of shapes in the entry.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Group(shapes) => shapes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record that was not decoded.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    /// Archive entry name.
    pub entry: String,
    /// Why the record was skipped.
    pub reason: String,
    #[serde(skip)]
    pub category: ErrorCategory,
}

/// Audit log of one decode.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadReport {
    /// Entries that matched the name pattern.
    pub matched: usize,
    /// Records decoded into shapes.
    pub decoded: usize,
    /// Records that were skipped.
    pub skipped: Vec<SkippedEntry>,
    /// Record names decoded more than once; the last record wins.
    pub replaced: Vec<String>,
}

impl ReadReport {
    fn skip(&mut self, entry: &str, err: &RoiError) {
        warn!(entry, error = %err, "skipping ROI record");
        self.skipped.push(SkippedEntry {
            entry: entry.to_string(),
            reason: err.to_string(),
            category: err.category(),
        });
    }
}

/// Shapes decoded from one archive, keyed by group.
#[derive(Debug, Clone, Serialize)]
pub struct RoiArchive {
    pub name: String,
    pub entries: BTreeMap<String, RoiEntry>,
    #[serde(skip)]
    pub report: ReadReport,
}

impl RoiArchive {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
            report: ReadReport::default(),
        }
    }

    /// Total number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(RoiEntry::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a shape by group and index. An empty index finds an unindexed
    /// shape.
    #[must_use]
    pub fn get(&self, group: &str, index: &str) -> Option<&Roi> {
        match self.entries.get(group)? {
            RoiEntry::Single(roi) if index.is_empty() => Some(roi),
            RoiEntry::Single(_) => None,
            RoiEntry::Group(shapes) => shapes.get(index),
        }
    }

    /// Every shape as `(group, index, shape)`, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Roi)> {
        self.entries
            .iter()
            .flat_map(|(group, entry)| -> Box<dyn Iterator<Item = _>> {
                match entry {
                    RoiEntry::Single(roi) => Box::new(std::iter::once((group.as_str(), "", roi))),
                    RoiEntry::Group(shapes) => Box::new(
                        shapes
                            .iter()
                            .map(move |(index, roi)| (group.as_str(), index.as_str(), roi)),
                    ),
                }
            })
    }

    fn insert(&mut self, token: NameToken, roi: Roi) {
        let NameToken { group, index } = token;
        let full_name = if index.is_empty() {
            group.clone()
        } else {
            format!("{group}/{index}")
        };
        let replaced = match self.entries.remove(&group) {
            None if index.is_empty() => {
                self.entries.insert(group, RoiEntry::Single(roi));
                false
            }
            None => {
                self.entries
                    .insert(group, RoiEntry::Group(BTreeMap::from([(index, roi)])));
                false
            }
            Some(RoiEntry::Single(_)) if index.is_empty() => {
                self.entries.insert(group, RoiEntry::Single(roi));
                true
            }
            Some(RoiEntry::Single(previous)) => {
                let shapes = BTreeMap::from([(String::new(), previous), (index, roi)]);
                self.entries.insert(group, RoiEntry::Group(shapes));
                false
            }
            Some(RoiEntry::Group(mut shapes)) => {
                let replaced = shapes.insert(index, roi).is_some();
                self.entries.insert(group, RoiEntry::Group(shapes));
                replaced
            }
        };
        if replaced {
            warn!(name = %full_name, "duplicate ROI name, keeping the later record");
            self.report.replaced.push(full_name);
        }
    }
}

/// Read a ROI archive, or a single `.roi` record, from a path.
pub fn read_archive(path: &Path, options: &ReaderOptions) -> Result<RoiArchive> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RoiError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RoiError::Io(e)
        }
    })?;
    let archive_name = options.archive_name.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let is_single_record = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ROI_EXTENSION));
    if is_single_record {
        let mut data = Vec::new();
        let mut file = file;
        file.read_to_end(&mut data)?;
        let entry_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(decode_entries(
            &archive_name,
            vec![RawEntry::new(entry_name, data)],
            options,
        ));
    }

    read_archive_from(file, &archive_name, options)
}

/// Read a ROI zip archive from any seekable reader.
pub fn read_archive_from<R: Read + Seek>(
    reader: R,
    archive_name: &str,
    options: &ReaderOptions,
) -> Result<RoiArchive> {
    let pattern = Regex::new(&options.pattern)?;
    let mut zip = ZipArchive::new(reader)?;
    let mut entries = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        if file.is_dir() || !pattern.is_match(file.name()) {
            continue;
        }
        let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut data)?;
        entries.push(RawEntry::new(file.name(), data));
    }
    debug!(archive = archive_name, entries = entries.len(), "read archive entries");
    Ok(decode_entries(archive_name, entries, options))
}

/// Read several archives, keyed by archive name.
pub fn read_archives<P: AsRef<Path>>(
    paths: &[P],
    options: &ReaderOptions,
) -> Result<BTreeMap<String, RoiArchive>> {
    let mut archives = BTreeMap::new();
    for path in paths {
        let archive = read_archive(path.as_ref(), options)?;
        archives.insert(archive.name.clone(), archive);
    }
    Ok(archives)
}

/// Decode in-memory entries.
///
/// Entries are decoded in order; malformed ones are skipped and listed in the
/// report.
#[must_use]
pub fn decode_entries(
    archive_name: &str,
    entries: Vec<RawEntry>,
    options: &ReaderOptions,
) -> RoiArchive {
    let mut archive = RoiArchive::new(archive_name);
    archive.report.matched = entries.len();

    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.data.get(..MAGIC.len()) {
            Some(tag) if tag == MAGIC => {}
            found => {
                let mut tag = [0u8; 4];
                if let Some(found) = found {
                    tag.copy_from_slice(found);
                }
                archive.report.skip(&entry.name, &RoiError::InvalidMagic { found: tag });
                continue;
            }
        }
        if entry.data.len() < HEADER_SIZE {
            let err = RoiError::truncated("primary header", HEADER_SIZE, entry.data.len());
            archive.report.skip(&entry.name, &err);
            continue;
        }
        candidates.push(entry);
    }

    // Pass 1: every primary header at once.
    let mut prefixes = Vec::with_capacity(candidates.len() * HEADER_SIZE);
    for entry in &candidates {
        prefixes.extend_from_slice(&entry.data[..HEADER_SIZE]);
    }
    let primaries = PrimaryHeader::parse_many(&prefixes);

    // Pass 2: each secondary header at its record's own offset.
    let mut located = Vec::with_capacity(candidates.len());
    let mut blocks = Vec::with_capacity(candidates.len() * HEADER2_SIZE);
    for (entry, primary) in candidates.into_iter().zip(primaries) {
        match secondary_block(&entry.data, primary.hdr2_offset) {
            Ok(block) => {
                blocks.extend_from_slice(&block);
                located.push((entry, primary));
            }
            Err(err) => archive.report.skip(&entry.name, &err),
        }
    }
    let secondaries = SecondaryHeader::parse_many(&blocks);

    let records: Vec<_> = located
        .into_iter()
        .zip(secondaries)
        .map(|((entry, primary), secondary)| (entry, primary, secondary))
        .collect();

    let decode = |(entry, primary, secondary): &(RawEntry, PrimaryHeader, SecondaryHeader)| {
        decode_record(entry, primary, secondary, options.separator.as_deref())
    };
    let results: Vec<Result<(NameToken, Roi)>> = if options.parallel {
        records.par_iter().map(decode).collect()
    } else {
        records.iter().map(decode).collect()
    };

    for ((entry, _, _), result) in records.iter().zip(results) {
        match result {
            Ok((token, roi)) => {
                debug!(entry = %entry.name, kind = %roi.kind(), group = %token.group, "decoded ROI");
                archive.report.decoded += 1;
                archive.insert(token, roi);
            }
            Err(err) => archive.report.skip(&entry.name, &err),
        }
    }

    info!(
        archive = archive_name,
        decoded = archive.report.decoded,
        skipped = archive.report.skipped.len(),
        "decoded ROI archive"
    );
    archive
}

fn to_offset(value: i32, field: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| RoiError::InvalidOffset { field, value })
}

/// Slice the secondary header of one record. Records without one (offset 0)
/// get an all-zero header.
fn secondary_block(data: &[u8], hdr2_offset: i32) -> Result<[u8; HEADER2_SIZE]> {
    let mut block = [0u8; HEADER2_SIZE];
    let start = to_offset(hdr2_offset, "hdr2_offset")?;
    if start == 0 {
        return Ok(block);
    }
    if start < HEADER_SIZE {
        return Err(RoiError::InvalidOffset {
            field: "hdr2_offset",
            value: hdr2_offset,
        });
    }
    let end = start + HEADER2_SIZE;
    let slice = data
        .get(start..end)
        .ok_or_else(|| RoiError::truncated("secondary header", end, data.len()))?;
    block.copy_from_slice(slice);
    Ok(block)
}

/// Decode `units` UTF-16 code units at a header-supplied offset.
fn read_text(
    data: &[u8],
    offset: i32,
    units: i32,
    what: &'static str,
) -> Result<Option<String>> {
    let units = to_offset(units, what)?;
    if units == 0 {
        return Ok(None);
    }
    let start = to_offset(offset, what)?;
    decode_utf16_be(data, start, units)
        .map(Some)
        .ok_or_else(|| RoiError::truncated(what, start + 2 * units, data.len()))
}

/// Per-record decode: name, property text, geometry.
fn decode_record(
    entry: &RawEntry,
    primary: &PrimaryHeader,
    secondary: &SecondaryHeader,
    separator: Option<&str>,
) -> Result<(NameToken, Roi)> {
    let data = &entry.data;
    let name = match read_text(data, secondary.name_offset, secondary.name_length, "name")? {
        Some(name) => name,
        None => default_record_name(&entry.name),
    };
    let props = read_text(
        data,
        secondary.roi_props_offset,
        secondary.roi_props_length,
        "property text",
    )?
    .map(|text| PropertyText::parse(&text))
    .unwrap_or_default();

    let payload_end = match to_offset(primary.hdr2_offset, "hdr2_offset")? {
        0 => data.len(),
        offset => offset,
    };
    let roi = Roi::from_record(primary, secondary, data, payload_end, props)?;
    Ok((NameToken::parse(&name, separator), roi))
}

/// Record name derived from an entry name: the file name without `.roi`.
fn default_record_name(entry: &str) -> String {
    let file_name = entry.rsplit('/').next().unwrap_or(entry);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(ROI_EXTENSION) => stem.to_string(),
        _ => file_name.to_string(),
    }
}
