//! Builds a [`FeedStore`] from a directory of GTFS tables.
//!
//! Reads routes, trips, stops, calendar, calendar_dates and stop_times.
//! shapes.txt is deliberately not read here; shapes are streamed per
//! request by the `shapes` module.
//!
//! A table that is missing or has a broken header contributes nothing, and
//! the remaining tables are still read so that every problem gets logged
//! in one pass. If any required table failed, the build fails with the
//! first such error. Running out of memory on stop_times, or being
//! cancelled, aborts immediately and drops everything built so far.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::calendar::ServiceCalendar;
use crate::cancel::CancelFlag;
use crate::domain::{Route, RouteId, Stop, StopId, StopTime, Trip, TripId};

use super::error::FeedError;
use super::reader::{TableReader, Volume};
use super::store::FeedStore;
use super::tables::{self, *};

/// How often (in rows) long loops check for cancellation.
const CANCEL_CHECK_ROWS: usize = 4096;

/// Ingestion limits and logging knobs.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum stop_times rows to hold. Exceeding it is treated like running
    /// out of memory. `None` means no limit beyond available memory.
    pub max_stop_times: Option<usize>,

    /// Skipped rows logged at `warn` per low-volume table.
    pub row_warning_limit: usize,
}

impl IngestConfig {
    pub fn with_max_stop_times(mut self, max: usize) -> Self {
        self.max_stop_times = Some(max);
        self
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_stop_times: None,
            row_warning_limit: 5,
        }
    }
}

/// Read every table under `dir` into a new store.
pub fn build_store(
    dir: &Path,
    config: &IngestConfig,
    cancel: &CancelFlag,
) -> Result<FeedStore, FeedError> {
    info!(dir = %dir.display(), "building feed store");
    let mut store = FeedStore::default();
    let mut failures = Vec::new();

    if let Some(routes) = tolerate(load_routes(dir, config), &mut failures)? {
        store.routes = routes.routes;
        store.route_index = routes.index;
        store.route_aliases = routes.aliases;
    }
    check_cancelled(cancel)?;

    if let Some((trips, index)) = tolerate(load_trips(dir, config), &mut failures)? {
        store.trips = trips;
        store.trip_index = index;
    }
    check_cancelled(cancel)?;

    if let Some(stops) = tolerate(load_stops(dir, config), &mut failures)? {
        store.stops = stops;
    }
    check_cancelled(cancel)?;

    if let Some(calendar) = tolerate(load_calendar(dir, config), &mut failures)? {
        store.calendar = calendar;
    }
    match load_calendar_dates(dir, config, &mut store.calendar) {
        Ok(()) => {}
        Err(FeedError::FileMissing { table }) => {
            debug!(table, "optional table absent");
        }
        Err(err) => warn!(error = %err, "optional table ignored"),
    }
    debug!(
        services = store.calendar.item_count(),
        exceptions = store.calendar.exception_count(),
        "calendar loaded"
    );
    check_cancelled(cancel)?;

    if let Some(stop_times) = tolerate(load_stop_times(dir, config, cancel), &mut failures)? {
        store.stop_times = stop_times;
    }

    if let Some(first) = failures.into_iter().next() {
        return Err(first);
    }

    if store.routes.is_empty()
        && store.trips.is_empty()
        && store.stops.is_empty()
        && store.stop_times.is_empty()
    {
        return Err(FeedError::Incomplete {
            reason: "no routes, trips, stops or stop times".to_string(),
        });
    }

    log_consistency(&store);
    let summary = store.summary();
    info!(
        routes = summary.routes,
        trips = summary.trips,
        stops = summary.stops,
        stop_times = summary.stop_times,
        services = summary.services,
        "feed store built"
    );
    Ok(store)
}

/// Keep going after a table-level failure, but stop for cancellation and
/// resource exhaustion.
fn tolerate<T>(
    result: Result<T, FeedError>,
    failures: &mut Vec<FeedError>,
) -> Result<Option<T>, FeedError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ (FeedError::Cancelled | FeedError::ResourceExhausted { .. })) => Err(err),
        Err(err) => {
            warn!(error = %err, "table failed to load");
            failures.push(err);
            Ok(None)
        }
    }
}

fn check_cancelled(cancel: &CancelFlag) -> Result<(), FeedError> {
    if cancel.is_cancelled() {
        return Err(FeedError::Cancelled);
    }
    Ok(())
}

fn open(
    dir: &Path,
    table: &'static str,
    required: &[&str],
    volume: Volume,
    config: &IngestConfig,
) -> Result<TableReader<std::io::BufReader<std::fs::File>>, FeedError> {
    Ok(TableReader::open(dir, table, required, volume)?.with_warning_limit(config.row_warning_limit))
}

struct LoadedRoutes {
    routes: Vec<Route>,
    index: HashMap<RouteId, usize>,
    aliases: HashMap<RouteId, RouteId>,
}

/// Routes that present identically (same names, agency and type) collapse
/// onto the first id seen. Later ids become aliases of it.
fn load_routes(dir: &Path, config: &IngestConfig) -> Result<LoadedRoutes, FeedError> {
    let mut reader = open(dir, tables::ROUTES, ROUTES_REQUIRED, Volume::Low, config)?;
    let mut loaded = LoadedRoutes {
        routes: Vec::new(),
        index: HashMap::new(),
        aliases: HashMap::new(),
    };
    let mut by_key: HashMap<String, usize> = HashMap::new();

    while let Some(row) = reader.next_row() {
        let route = match route_from_row(&row) {
            Ok(route) => route,
            Err(err) => {
                reader.skip_row(row.line(), &err);
                continue;
            }
        };
        if loaded.index.contains_key(&route.id) || loaded.aliases.contains_key(&route.id) {
            reader.skip_row(row.line(), &format_args!("duplicate route_id {}", route.id));
            continue;
        }
        match by_key.entry(route.dedup_key()) {
            Entry::Occupied(existing) => {
                let canonical = loaded.routes[*existing.get()].id.clone();
                debug!(route = %route.id, %canonical, "collapsing duplicate route");
                loaded.aliases.insert(route.id, canonical);
            }
            Entry::Vacant(slot) => {
                slot.insert(loaded.routes.len());
                loaded.index.insert(route.id.clone(), loaded.routes.len());
                loaded.routes.push(route);
            }
        }
    }
    reader.finish();
    Ok(loaded)
}

fn load_trips(
    dir: &Path,
    config: &IngestConfig,
) -> Result<(Vec<Trip>, HashMap<TripId, usize>), FeedError> {
    let mut reader = open(dir, tables::TRIPS, TRIPS_REQUIRED, Volume::Low, config)?;
    let mut trips = Vec::new();
    let mut index = HashMap::new();

    while let Some(row) = reader.next_row() {
        match trip_from_row(&row) {
            Ok(trip) => {
                if index.contains_key(&trip.id) {
                    reader.skip_row(row.line(), &format_args!("duplicate trip_id {}", trip.id));
                    continue;
                }
                index.insert(trip.id.clone(), trips.len());
                trips.push(trip);
            }
            Err(err) => reader.skip_row(row.line(), &err),
        }
    }
    reader.finish();
    Ok((trips, index))
}

fn load_stops(dir: &Path, config: &IngestConfig) -> Result<HashMap<StopId, Stop>, FeedError> {
    let mut reader = open(dir, tables::STOPS, STOPS_REQUIRED, Volume::Low, config)?;
    let mut stops = HashMap::new();

    while let Some(row) = reader.next_row() {
        match stop_from_row(&row) {
            Ok(stop) => match stops.entry(stop.id.clone()) {
                Entry::Occupied(_) => {
                    reader.skip_row(row.line(), &format_args!("duplicate stop_id {}", stop.id));
                }
                Entry::Vacant(slot) => {
                    slot.insert(stop);
                }
            },
            Err(err) => reader.skip_row(row.line(), &err),
        }
    }
    reader.finish();
    Ok(stops)
}

fn load_calendar(dir: &Path, config: &IngestConfig) -> Result<ServiceCalendar, FeedError> {
    let mut reader = open(dir, tables::CALENDAR, CALENDAR_REQUIRED, Volume::Low, config)?;
    let mut calendar = ServiceCalendar::new();

    while let Some(row) = reader.next_row() {
        match calendar_item_from_row(&row) {
            Ok(item) => {
                let service_id = item.service_id.clone();
                if !calendar.insert_item(item) {
                    reader.skip_row(row.line(), &format_args!("duplicate service_id {service_id}"));
                }
            }
            Err(err) => reader.skip_row(row.line(), &err),
        }
    }
    reader.finish();
    Ok(calendar)
}

fn load_calendar_dates(
    dir: &Path,
    config: &IngestConfig,
    calendar: &mut ServiceCalendar,
) -> Result<(), FeedError> {
    let mut reader = open(
        dir,
        tables::CALENDAR_DATES,
        CALENDAR_DATES_REQUIRED,
        Volume::Low,
        config,
    )?;
    while let Some(row) = reader.next_row() {
        match calendar_exception_from_row(&row) {
            Ok(exception) => calendar.insert_exception(exception),
            Err(err) => reader.skip_row(row.line(), &err),
        }
    }
    reader.finish();
    Ok(())
}

/// The largest table. Rows are grouped by trip, then each group is sorted
/// by stop_sequence. Growth goes through `try_reserve` so that allocation
/// failure comes back as an error instead of aborting the process.
fn load_stop_times(
    dir: &Path,
    config: &IngestConfig,
    cancel: &CancelFlag,
) -> Result<HashMap<TripId, Vec<StopTime>>, FeedError> {
    let table = tables::STOP_TIMES;
    let mut reader = open(dir, table, STOP_TIMES_REQUIRED, Volume::High, config)?;
    let mut by_trip: HashMap<TripId, Vec<StopTime>> = HashMap::new();
    let mut count = 0usize;

    let exhausted = |rows: usize| {
        warn!(table, rows, "out of memory reading stop times, discarding partial feed");
        FeedError::ResourceExhausted { table, rows }
    };

    while let Some(row) = reader.next_row() {
        if reader.stats().rows % CANCEL_CHECK_ROWS == 0 {
            check_cancelled(cancel)?;
        }
        let stop_time = match stop_time_from_row(&row) {
            Ok(st) => st,
            Err(err) => {
                reader.skip_row(row.line(), &err);
                continue;
            }
        };
        if config.max_stop_times.is_some_and(|max| count >= max) {
            return Err(exhausted(count));
        }
        if !by_trip.contains_key(&stop_time.trip_id) {
            by_trip.try_reserve(1).map_err(|_| exhausted(count))?;
        }
        let times = by_trip.entry(stop_time.trip_id.clone()).or_default();
        try_push(times, stop_time).map_err(|_| exhausted(count))?;
        count += 1;
    }
    reader.finish();
    check_cancelled(cancel)?;

    for times in by_trip.values_mut() {
        times.sort_by_key(|st| st.sequence);
    }
    Ok(by_trip)
}

fn try_push<T>(vec: &mut Vec<T>, value: T) -> Result<(), std::collections::TryReserveError> {
    if vec.len() == vec.capacity() {
        vec.try_reserve(vec.capacity().max(4))?;
    }
    vec.push(value);
    Ok(())
}

/// References between tables are allowed to dangle; say how often they do.
fn log_consistency(store: &FeedStore) {
    let unknown_routes = store
        .trips
        .iter()
        .filter(|t| store.route(&t.route_id).is_none())
        .count();
    let unknown_services = store
        .trips
        .iter()
        .filter(|t| {
            store.calendar.item(&t.service_id).is_none()
                && store.calendar.exceptions(&t.service_id).is_empty()
        })
        .count();
    let orphan_stop_times = store
        .stop_times
        .keys()
        .filter(|id| !store.trip_index.contains_key(*id))
        .count();
    if unknown_routes + unknown_services + orphan_stop_times > 0 {
        warn!(
            unknown_routes,
            unknown_services, orphan_stop_times, "feed has dangling references"
        );
    }
}
