//! Column-name indexed reader for GTFS tables.
//!
//! Wraps a `csv` reader so that rows are looked up by header name rather
//! than position. Optional columns that the header lacks simply read as
//! absent. Rows with the wrong number of fields are skipped; the caller
//! reports rows it cannot convert through [`TableReader::skip_row`] so that
//! all skips share one logging policy.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::{debug, trace, warn};

use super::error::FeedError;

/// How noisy skipped rows should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    /// Small tables: log the first few skips at `warn`.
    Low,
    /// stop_times and shapes: skips only go to `trace`.
    High,
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("missing value for {0}")]
    Missing(&'static str),

    #[error("invalid {column}: {value:?}")]
    Invalid { column: &'static str, value: String },
}

/// Header name to field position.
#[derive(Debug)]
struct Header {
    index: HashMap<String, usize>,
}

impl Header {
    fn new(record: &StringRecord) -> Self {
        let index = record
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|col| !self.index.contains_key(*col))
            .collect()
    }
}

/// One data row, addressable by column name.
#[derive(Debug)]
pub struct Row {
    record: StringRecord,
    header: Arc<Header>,
}

impl Row {
    /// The trimmed value of `column`, or `None` if the column is absent or
    /// the value is empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = *self.header.index.get(column)?;
        self.record
            .get(idx)
            .map(unquote)
            .filter(|v| !v.is_empty())
    }

    /// The value of a column the row cannot do without.
    pub fn require(&self, column: &'static str) -> Result<&str, RowError> {
        self.get(column).ok_or(RowError::Missing(column))
    }

    /// Owned copy of an optional text column.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    /// Parse an optional column. Absent is `Ok(None)`, unparsable is an error.
    pub fn parse<T: FromStr>(&self, column: &'static str) -> Result<Option<T>, RowError> {
        match self.get(column) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| RowError::Invalid {
                column,
                value: value.to_string(),
            }),
        }
    }

    /// Parse a column the row cannot do without.
    pub fn parse_required<T: FromStr>(&self, column: &'static str) -> Result<T, RowError> {
        self.parse(column)?.ok_or(RowError::Missing(column))
    }

    /// Line number in the source file, for log messages.
    pub fn line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }
}

/// Strip quotes the csv parser left in place, which happens when a quoted
/// field has whitespace before the opening quote.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(value)
}

/// Counts reported when a table has been fully read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub rows: usize,
    pub skipped: usize,
    /// The stream failed part way through; later rows were never seen.
    pub truncated: bool,
}

/// Forward-only reader over one table. Consume it once.
pub struct TableReader<R: Read> {
    table: &'static str,
    volume: Volume,
    warning_limit: usize,
    header: Arc<Header>,
    records: StringRecordsIntoIter<R>,
    stats: TableStats,
}

impl TableReader<BufReader<File>> {
    /// Open `dir/table`, check its header and position at the first row.
    pub fn open(
        dir: &Path,
        table: &'static str,
        required: &[&str],
        volume: Volume,
    ) -> Result<Self, FeedError> {
        let path = dir.join(table);
        let file = File::open(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FeedError::FileMissing { table },
            _ => FeedError::Unreadable { table, source: err },
        })?;
        Self::from_reader(BufReader::new(file), table, required, volume)
    }
}

impl<R: Read> TableReader<R> {
    /// Wrap any byte stream whose first line is the header.
    pub fn from_reader(
        reader: R,
        table: &'static str,
        required: &[&str],
        volume: Volume,
    ) -> Result<Self, FeedError> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(false)
            .from_reader(reader);

        let header = Header::new(csv.headers().map_err(|err| FeedError::Unreadable {
            table,
            source: err.into(),
        })?);

        let missing = header.missing(required);
        if !missing.is_empty() {
            return Err(FeedError::MalformedSchema {
                table,
                missing: missing.into_iter().map(String::from).collect(),
            });
        }

        Ok(Self {
            table,
            volume,
            warning_limit: 5,
            header: Arc::new(header),
            records: csv.into_records(),
            stats: TableStats::default(),
        })
    }

    /// How many skipped rows to log at `warn` for low-volume tables.
    pub fn with_warning_limit(mut self, limit: usize) -> Self {
        self.warning_limit = limit;
        self
    }

    /// Next well-formed row. Rows with the wrong field count are skipped.
    pub fn next_row(&mut self) -> Option<Row> {
        loop {
            match self.records.next()? {
                Ok(record) => {
                    self.stats.rows += 1;
                    return Some(Row {
                        record,
                        header: self.header.clone(),
                    });
                }
                Err(err) => {
                    if let csv::ErrorKind::Io(_) = err.kind() {
                        warn!(table = self.table, error = %err, "read failed, table truncated");
                        self.stats.truncated = true;
                        return None;
                    }
                    self.stats.rows += 1;
                    let line = err.position().map(|p| p.line()).unwrap_or(0);
                    self.skip_row(line, &err);
                }
            }
        }
    }

    /// Record that the row at `line` was rejected.
    pub fn skip_row(&mut self, line: u64, reason: &dyn fmt::Display) {
        self.stats.skipped += 1;
        match self.volume {
            Volume::Low if self.stats.skipped <= self.warning_limit => {
                warn!(table = self.table, line, %reason, "skipping malformed row");
            }
            _ => trace!(table = self.table, line, %reason, "skipping malformed row"),
        }
    }

    /// Rows read and skipped so far.
    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Log a one-line summary and return the final counts.
    pub fn finish(self) -> TableStats {
        debug!(
            table = self.table,
            rows = self.stats.rows,
            skipped = self.stats.skipped,
            "table read"
        );
        if self.volume == Volume::Low && self.stats.skipped > self.warning_limit {
            warn!(
                table = self.table,
                skipped = self.stats.skipped,
                "further malformed rows were not logged"
            );
        }
        self.stats
    }
}

impl<R: Read> Iterator for TableReader<R> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.next_row()
    }
}
