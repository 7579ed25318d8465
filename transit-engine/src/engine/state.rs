//! Feed loading progress, as published to subscribers.

use serde::Serialize;

use crate::feed::{FeedError, FeedSummary, OutcomeKind};

/// Where the engine is with loading its feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing has been loaded yet.
    Idle,
    /// A load is running. Any earlier feed keeps serving queries.
    Loading,
    /// The last load succeeded.
    Ready { summary: FeedSummary },
    /// The last load failed. Any earlier feed keeps serving queries.
    Failed { kind: OutcomeKind, message: String },
}

impl LoadState {
    pub fn failed(err: &FeedError) -> Self {
        LoadState::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready { .. })
    }
}
