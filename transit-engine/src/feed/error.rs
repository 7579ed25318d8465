//! Feed ingestion error types.
//!
//! Low-level parse problems never surface here: a malformed row is skipped
//! inside the reader. These errors are table-level or build-level, and each
//! maps onto one of a small closed set of [`OutcomeKind`]s that callers can
//! render without looking at the cause.

use std::fmt;

use serde::Serialize;

/// The closed set of outcomes a caller needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeKind {
    /// An input table is missing or unreadable.
    FileMissing,
    /// A table lacks required columns.
    MalformedSchema,
    /// Ingestion ran out of memory or exceeded its budget.
    OutOfMemory,
    /// A query arrived before a feed was loaded.
    NotReady,
    /// The query succeeded but found nothing.
    NoResults,
    /// The operation was cancelled.
    Cancelled,
    /// The operation succeeded.
    Succeeded,
    /// Anything else, such as a crashed worker.
    Internal,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OutcomeKind::FileMissing => "transit data file missing",
            OutcomeKind::MalformedSchema => "transit data file is malformed",
            OutcomeKind::OutOfMemory => "not enough memory to load transit data, try again later",
            OutcomeKind::NotReady => "transit data is still loading",
            OutcomeKind::NoResults => "no results found",
            OutcomeKind::Cancelled => "cancelled",
            OutcomeKind::Succeeded => "ok",
            OutcomeKind::Internal => "internal error",
        };
        f.write_str(text)
    }
}

/// Errors from reading feed tables and building a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The table file does not exist
    #[error("{table}: file not found")]
    FileMissing { table: &'static str },

    /// The table exists but could not be read
    #[error("{table}: {source}")]
    Unreadable {
        table: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The header lacks required columns
    #[error("{table}: missing required column(s) {}", .missing.join(", "))]
    MalformedSchema {
        table: &'static str,
        missing: Vec<String>,
    },

    /// Allocation failed or the configured row budget was exceeded
    #[error("{table}: resource exhausted after {rows} rows")]
    ResourceExhausted { table: &'static str, rows: usize },

    /// Every required table failed, or the feed has no usable content
    #[error("feed is unusable: {reason}")]
    Incomplete { reason: String },

    /// The build was cancelled before it finished
    #[error("feed load cancelled")]
    Cancelled,

    /// The blocking worker died
    #[error("feed worker failed: {0}")]
    Worker(String),
}

impl FeedError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FeedError::FileMissing { .. } | FeedError::Unreadable { .. } => {
                OutcomeKind::FileMissing
            }
            FeedError::MalformedSchema { .. } | FeedError::Incomplete { .. } => {
                OutcomeKind::MalformedSchema
            }
            FeedError::ResourceExhausted { .. } => OutcomeKind::OutOfMemory,
            FeedError::Cancelled => OutcomeKind::Cancelled,
            FeedError::Worker(_) => OutcomeKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::FileMissing { table: "routes.txt" };
        assert_eq!(err.to_string(), "routes.txt: file not found");

        let err = FeedError::MalformedSchema {
            table: "stops.txt",
            missing: vec!["stop_id".into(), "stop_lat".into()],
        };
        assert_eq!(
            err.to_string(),
            "stops.txt: missing required column(s) stop_id, stop_lat"
        );

        let err = FeedError::ResourceExhausted {
            table: "stop_times.txt",
            rows: 10,
        };
        assert_eq!(
            err.to_string(),
            "stop_times.txt: resource exhausted after 10 rows"
        );
    }

    #[test]
    fn kinds() {
        let unreadable = FeedError::Unreadable {
            table: "trips.txt",
            source: std::io::Error::other("boom"),
        };
        assert_eq!(unreadable.kind(), OutcomeKind::FileMissing);
        assert_eq!(
            FeedError::ResourceExhausted {
                table: "stop_times.txt",
                rows: 0
            }
            .kind(),
            OutcomeKind::OutOfMemory
        );
        assert_eq!(FeedError::Cancelled.kind(), OutcomeKind::Cancelled);
        assert_eq!(
            FeedError::Worker("panic".into()).kind(),
            OutcomeKind::Internal
        );
    }
}
