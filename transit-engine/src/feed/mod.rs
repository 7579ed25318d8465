//! GTFS feed ingestion: the table reader, row conversion, the store builder
//! and the resulting immutable snapshot.

pub mod builder;
pub mod error;
pub mod reader;
pub mod store;
pub mod tables;

#[cfg(test)]
pub(crate) mod test_feed;

pub use builder::{IngestConfig, build_store};
pub use error::{FeedError, OutcomeKind};
pub use reader::{Row, RowError, TableReader, TableStats, Volume};
pub use store::{FeedStore, FeedSummary};
pub use tables::ShapePoint;
