//! Engine configuration.

use std::path::PathBuf;

use crate::cache::ShapeCacheConfig;
use crate::feed::IngestConfig;
use crate::planner::PlannerConfig;

/// Everything the engine needs to know up front.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the extracted GTFS tables.
    pub feed_dir: PathBuf,

    pub planner: PlannerConfig,

    pub ingest: IngestConfig,

    pub shape_cache: ShapeCacheConfig,
}

impl EngineConfig {
    /// Default settings for the feed in `feed_dir`.
    pub fn new(feed_dir: impl Into<PathBuf>) -> Self {
        Self {
            feed_dir: feed_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    pub fn with_shape_cache(mut self, shape_cache: ShapeCacheConfig) -> Self {
        self.shape_cache = shape_cache;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_dir: PathBuf::from("gtfs"),
            planner: PlannerConfig::default(),
            ingest: IngestConfig::default(),
            shape_cache: ShapeCacheConfig::default(),
        }
    }
}
