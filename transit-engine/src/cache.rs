//! Caching layer for shape geometry.
//!
//! Shapes are read from disk on demand, which means a full scan of
//! shapes.txt per shape. The same few shapes tend to be asked for again
//! while a user looks at a suggestion, so recent ones are kept for a while.
//!
//! Entries are only valid for the feed they were read from; the engine
//! clears the cache whenever a new feed is published.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{LatLon, ShapeId};

/// Cached shape polyline.
pub type ShapeEntry = Arc<Vec<LatLon>>;

/// Configuration for the shape cache.
#[derive(Debug, Clone)]
pub struct ShapeCacheConfig {
    /// TTL for cached shapes.
    pub ttl: Duration,

    /// Maximum number of cached shapes.
    pub max_capacity: u64,
}

impl Default for ShapeCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10 * 60),
            max_capacity: 64,
        }
    }
}

/// Time and size bounded cache of shapes, keyed by shape id.
pub struct ShapeCache {
    shapes: MokaCache<ShapeId, ShapeEntry>,
}

impl ShapeCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &ShapeCacheConfig) -> Self {
        let shapes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { shapes }
    }

    pub async fn get(&self, id: &ShapeId) -> Option<ShapeEntry> {
        self.shapes.get(id).await
    }

    pub async fn insert(&self, id: ShapeId, entry: ShapeEntry) {
        self.shapes.insert(id, entry).await;
    }

    /// Approximate number of cached shapes (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.shapes.entry_count()
    }

    /// Drop every cached shape.
    pub fn invalidate_all(&self) {
        self.shapes.invalidate_all();
    }
}
