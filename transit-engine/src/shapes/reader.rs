//! On-demand shape reader.
//!
//! shapes.txt is usually the largest table in a feed, so it is never
//! loaded into the store. Each request rescans the file and keeps only the
//! rows of the one shape asked for.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::cancel::CancelFlag;
use crate::domain::{LatLon, ShapeId};
use crate::feed::tables::{self, SHAPES_REQUIRED, shape_point_from_row};
use crate::feed::{FeedError, TableReader, Volume};

const CANCEL_CHECK_ROWS: usize = 8192;

/// Read `dir/shapes.txt` and return the points of `shape_id` in sequence
/// order.
pub fn read_shape_file(
    dir: &Path,
    shape_id: &ShapeId,
    cancel: &CancelFlag,
) -> Result<Vec<LatLon>, FeedError> {
    let reader = TableReader::open(dir, tables::SHAPES, SHAPES_REQUIRED, Volume::High)?;
    collect_shape(reader, shape_id, cancel)
}

/// Like [`read_shape_file`], over any stream whose first line is the
/// shapes.txt header.
pub fn read_shape<R: Read>(
    shape_id: &ShapeId,
    source: R,
    cancel: &CancelFlag,
) -> Result<Vec<LatLon>, FeedError> {
    let reader = TableReader::from_reader(source, tables::SHAPES, SHAPES_REQUIRED, Volume::High)?;
    collect_shape(reader, shape_id, cancel)
}

fn collect_shape<R: Read>(
    mut reader: TableReader<R>,
    shape_id: &ShapeId,
    cancel: &CancelFlag,
) -> Result<Vec<LatLon>, FeedError> {
    let mut points = Vec::new();

    while let Some(row) = reader.next_row() {
        if reader.stats().rows % CANCEL_CHECK_ROWS == 0 && cancel.is_cancelled() {
            return Err(FeedError::Cancelled);
        }
        // Compare the id before converting anything else in the row.
        if row.get("shape_id") != Some(shape_id.as_str()) {
            continue;
        }
        match shape_point_from_row(&row) {
            Ok(point) => points.push(point),
            Err(err) => reader.skip_row(row.line(), &err),
        }
    }
    let stats = reader.finish();

    points.sort_by_key(|p| p.sequence);
    debug!(
        shape = %shape_id,
        points = points.len(),
        scanned = stats.rows,
        "shape read"
    );
    Ok(points.into_iter().map(|p| p.location).collect())
}
