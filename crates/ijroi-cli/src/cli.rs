//! CLI argument definitions for roitool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ijroi_format::{ReaderOptions, ShapeKind};

#[derive(Parser)]
#[command(
    name = "roitool",
    version,
    about = "Inspect, export and rewrite ImageJ ROI archives",
    long_about = "Inspect, export and rewrite ImageJ ROI archives.\n\n\
                  Reads single .roi files and RoiSet.zip archives. Rectangles, ellipses,\n\
                  polygons, polylines, freehand shapes and text labels are supported."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the shapes of one or more archives.
    List(ListArgs),

    /// Write the shapes of an archive as JSON.
    ExportJson(ExportJsonArgs),

    /// Re-encode the shapes of an archive into another archive.
    Copy(CopyArgs),

    /// List shape kinds and the kinds each can be written as.
    Kinds,
}

/// Options shared by every command that reads archives.
#[derive(Args, Clone, Debug)]
pub struct ReadArgs {
    /// Regular expression an entry name must match.
    #[arg(long = "pattern", value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Split record names into group and index on this separator.
    #[arg(long = "sep", value_name = "SEP")]
    pub separator: Option<String>,

    /// Decode records on a single thread.
    #[arg(long = "sequential")]
    pub sequential: bool,
}

impl ReadArgs {
    pub fn reader_options(&self) -> ReaderOptions {
        let mut options = ReaderOptions::new();
        if let Some(pattern) = &self.pattern {
            options = options.with_pattern(pattern.clone());
        }
        if let Some(separator) = &self.separator {
            options = options.with_separator(separator.clone());
        }
        if self.sequential {
            options = options.sequential();
        }
        options
    }
}

#[derive(Parser)]
pub struct ListArgs {
    /// Archives or single .roi files.
    #[arg(value_name = "ARCHIVE", required = true)]
    pub archives: Vec<PathBuf>,

    #[command(flatten)]
    pub read: ReadArgs,
}

#[derive(Parser)]
pub struct ExportJsonArgs {
    /// Archive or single .roi file.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output file (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub read: ReadArgs,
}

#[derive(Parser)]
pub struct CopyArgs {
    /// Archive or single .roi file to read.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Archive to write.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Write every shape as this kind.
    #[arg(long = "as", value_enum, value_name = "KIND")]
    pub as_kind: Option<ShapeKindArg>,

    /// Image name recorded in each record's property text.
    #[arg(long = "image-name", value_name = "NAME")]
    pub image_name: Option<String>,

    /// Add entries to an existing OUTPUT archive.
    #[arg(long = "append")]
    pub append: bool,

    /// Store entries uncompressed.
    #[arg(long = "stored")]
    pub stored: bool,

    /// Skip shapes that cannot be written as --as instead of failing.
    #[arg(long = "skip-incompatible")]
    pub skip_incompatible: bool,

    #[command(flatten)]
    pub read: ReadArgs,
}

/// CLI shape kind choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShapeKindArg {
    Rectangle,
    Ellipse,
    Polygon,
    Polyline,
    Freeline,
    Freehand,
    Text,
}

impl From<ShapeKindArg> for ShapeKind {
    fn from(arg: ShapeKindArg) -> Self {
        match arg {
            ShapeKindArg::Rectangle => ShapeKind::Rectangle,
            ShapeKindArg::Ellipse => ShapeKind::Ellipse,
            ShapeKindArg::Polygon => ShapeKind::Polygon,
            ShapeKindArg::Polyline => ShapeKind::Polyline,
            ShapeKindArg::Freeline => ShapeKind::FreeLine,
            ShapeKindArg::Freehand => ShapeKind::FreeHand,
            ShapeKindArg::Text => ShapeKind::Text,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_copy() {
        let cli = Cli::try_parse_from([
            "roitool",
            "copy",
            "in.zip",
            "out.zip",
            "--as",
            "freehand",
            "--sep",
            "-",
            "--image-name",
            "stack.tif",
        ])
        .unwrap();
        let Command::Copy(args) = cli.command else {
            panic!("expected copy");
        };
        assert_eq!(args.as_kind.map(ShapeKind::from), Some(ShapeKind::FreeHand));
        assert_eq!(args.image_name.as_deref(), Some("stack.tif"));
        let options = args.read.reader_options();
        assert_eq!(options.separator.as_deref(), Some("-"));
        assert!(options.parallel);
    }

    #[test]
    fn test_list_requires_archive() {
        assert!(Cli::try_parse_from(["roitool", "list"]).is_err());
    }
}
