//! Query error types.

use crate::feed::OutcomeKind;
use crate::planner::SuggestError;

/// Why a query could not be answered at all.
///
/// Empty results are not errors; see [`crate::answer::Answer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// No usable feed has been loaded yet
    #[error("transit data is not loaded")]
    NotReady,

    /// The query was abandoned before it finished
    #[error("query cancelled")]
    Cancelled,

    /// The blocking worker died
    #[error("query worker failed: {0}")]
    Worker(String),
}

impl QueryError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            QueryError::NotReady => OutcomeKind::NotReady,
            QueryError::Cancelled => OutcomeKind::Cancelled,
            QueryError::Worker(_) => OutcomeKind::Internal,
        }
    }
}

impl From<SuggestError> for QueryError {
    fn from(err: SuggestError) -> Self {
        match err {
            SuggestError::NotReady => QueryError::NotReady,
            SuggestError::Cancelled => QueryError::Cancelled,
        }
    }
}
