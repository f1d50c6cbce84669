use std::fs;

use anyhow::{Context, Result};
use comfy_table::Table;
use ijroi_format::shape::compat::skipped_fields;
use ijroi_format::{
    ReadReport, RoiArchive, RoiError, RoiZipWriter, ShapeKind, WriterOptions, encode_roi,
    read_archive,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::cli::{CopyArgs, ExportJsonArgs, ListArgs};
use crate::summary::apply_table_style;

/// Outcome of a copy.
#[derive(Debug, Default)]
pub struct CopyResult {
    /// Shapes written to the output archive.
    pub written: usize,
    /// Shapes left out, as `(record name, reason)`.
    pub skipped: Vec<(String, String)>,
    /// Records the decoder could not read.
    pub unreadable: usize,
}

impl CopyResult {
    pub fn has_errors(&self) -> bool {
        self.unreadable > 0 || !self.skipped.is_empty()
    }
}

pub fn run_list(args: &ListArgs) -> Result<Vec<RoiArchive>> {
    let options = args.read.reader_options();
    let mut archives = Vec::with_capacity(args.archives.len());
    for path in &args.archives {
        let span = info_span!("list", archive = %path.display());
        let _guard = span.enter();
        let archive = read_archive(path, &options)
            .with_context(|| format!("read {}", path.display()))?;
        info!(shapes = archive.len(), "listed archive");
        archives.push(archive);
    }
    Ok(archives)
}

pub fn run_export_json(args: &ExportJsonArgs) -> Result<()> {
    let span = info_span!("export_json", archive = %args.archive.display());
    let _guard = span.enter();
    let archive = read_archive(&args.archive, &args.read.reader_options())
        .with_context(|| format!("read {}", args.archive.display()))?;
    let text = export_json(&archive)?;
    match &args.output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
            info!(output = %path.display(), shapes = archive.len(), "exported archive");
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[derive(Serialize)]
struct Export<'a> {
    archive: &'a RoiArchive,
    report: &'a ReadReport,
}

/// Render an archive and its decode report as pretty JSON.
pub fn export_json(archive: &RoiArchive) -> Result<String> {
    let export = Export {
        archive,
        report: &archive.report,
    };
    serde_json::to_string_pretty(&export).context("serialize archive")
}

/// Record name of a shape: group and index joined on `separator`.
fn record_name(group: &str, index: &str, separator: Option<&str>) -> String {
    if index.is_empty() {
        group.to_string()
    } else {
        format!("{group}{}{index}", separator.unwrap_or("-"))
    }
}

pub fn run_copy(args: &CopyArgs) -> Result<CopyResult> {
    let span = info_span!("copy", input = %args.input.display(), output = %args.output.display());
    let _guard = span.enter();

    let archive = read_archive(&args.input, &args.read.reader_options())
        .with_context(|| format!("read {}", args.input.display()))?;

    let mut options = WriterOptions::new();
    if args.stored {
        options = options.stored();
    }

    // All records are encoded before the output is touched.
    let as_kind = args.as_kind.map(ShapeKind::from);
    let separator = args.read.separator.as_deref();
    let mut result = CopyResult {
        unreadable: archive.report.skipped.len(),
        ..CopyResult::default()
    };
    let mut records = Vec::with_capacity(archive.len());
    for (group, index, roi) in archive.iter() {
        let name = record_name(group, index, separator);
        match encode_roi(roi, &name, args.image_name.as_deref(), as_kind, &options) {
            Ok(record) => records.push((name, record)),
            Err(error @ RoiError::Incompatible { .. }) if args.skip_incompatible => {
                warn!(name = %name, %error, "skipping shape");
                result.skipped.push((name, error.to_string()));
            }
            Err(error) => {
                return Err(error).with_context(|| format!("write shape {name}"));
            }
        }
    }

    let mut writer = if args.append {
        RoiZipWriter::append(&args.output, options)
    } else {
        RoiZipWriter::create(&args.output, options)
    }
    .with_context(|| format!("open {}", args.output.display()))?;
    for (name, record) in &records {
        writer
            .write_record(name, record)
            .with_context(|| format!("write shape {name}"))?;
    }
    result.written = writer.written();
    writer
        .finish()
        .with_context(|| format!("finish {}", args.output.display()))?;
    debug!(written = result.written, "copy complete");
    Ok(result)
}

/// Kinds each shape kind can be written as, itself included.
pub fn compatible_targets(source: ShapeKind) -> Vec<ShapeKind> {
    ShapeKind::ALL
        .into_iter()
        .filter(|target| skipped_fields(source, *target).is_ok())
        .collect()
}

pub fn run_kinds() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Kind", "Can be written as"]);
    apply_table_style(&mut table);
    for kind in ShapeKind::ALL {
        let targets: Vec<String> = compatible_targets(kind)
            .into_iter()
            .filter(|target| *target != kind)
            .map(|target| target.name().to_string())
            .collect();
        let targets = if targets.is_empty() {
            "-".to_string()
        } else {
            targets.join(", ")
        };
        table.add_row(vec![kind.to_string(), targets]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name() {
        assert_eq!(record_name("cell", "", Some("_")), "cell");
        assert_eq!(record_name("cell", "3", Some("_")), "cell_3");
        assert_eq!(record_name("cell", "3", None), "cell-3");
    }

    #[test]
    fn test_compatible_targets() {
        let targets = compatible_targets(ShapeKind::Ellipse);
        assert!(targets.contains(&ShapeKind::Ellipse));
        assert!(targets.contains(&ShapeKind::Rectangle));
        assert!(targets.contains(&ShapeKind::Polygon));
        assert!(!targets.contains(&ShapeKind::Text));
        assert_eq!(compatible_targets(ShapeKind::Text), vec![ShapeKind::Text]);
    }
}
