//! Reader and writer options.

use chrono::NaiveDate;

/// Entry-name pattern matched by default: every `.roi` entry.
pub const DEFAULT_ENTRY_PATTERN: &str = r"(?i)\.roi$";

/// Options for reading ROI archives.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Regular expression an entry name must match to be decoded.
    pub pattern: String,
    /// Splits record names into group and index (no default).
    pub separator: Option<String>,
    /// Key of the decoded archive (default: the archive file stem).
    pub archive_name: Option<String>,
    /// Decode records on the rayon pool (default: true).
    pub parallel: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_ENTRY_PATTERN.to_string(),
            separator: None,
            archive_name: None,
            parallel: true,
        }
    }
}

impl ReaderOptions {
    /// Create reader options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only decode entries whose name matches `pattern`.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Split record names on `separator`.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Key the decoded archive by `name`.
    #[must_use]
    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = Some(name.into());
        self
    }

    /// Decode records on the calling thread.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Compression of written archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryCompression {
    #[default]
    Deflated,
    Stored,
}

/// Options for writing ROI records and archives.
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Date of the property-text date line (default: today).
    pub date: Option<NaiveDate>,
    /// Entry compression (default: deflate).
    pub compression: EntryCompression,
}

impl WriterOptions {
    /// Create writer options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp property text with a fixed date.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Store entries uncompressed.
    #[must_use]
    pub fn stored(mut self) -> Self {
        self.compression = EntryCompression::Stored;
        self
    }

    /// Date written to property text.
    #[must_use]
    pub fn effective_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
