//! Direct-trip search.
//!
//! For each trip running on the requested day, look for the first stop near
//! the origin that is still ahead of the current time, then the first stop
//! near the destination after it. Candidates are reduced to one per
//! (route, origin stop, destination stop) and ranked by departure.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::answer::{Advisory, Answer};
use crate::cancel::CancelFlag;
use crate::domain::{GtfsTime, LatLon, Route, RouteId, ShapeId, Stop, StopId, StopTime, TripId};
use crate::feed::FeedStore;
use crate::spatial::find_stops_near;

use super::config::PlannerConfig;
use super::rank::{keep_earliest, rank_options};

/// Error from suggestion search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestError {
    /// The store lacks routes, trips, stops, stop times or calendars
    #[error("transit data is not loaded")]
    NotReady,

    /// The search was cancelled between trips
    #[error("suggestion search cancelled")]
    Cancelled,
}

/// Request for direct-trip suggestions.
#[derive(Debug, Clone)]
pub struct SuggestRequest {
    pub origin: LatLon,
    pub destination: LatLon,

    /// Local date and time the traveller wants to leave.
    pub now: NaiveDateTime,
}

impl SuggestRequest {
    pub fn new(origin: LatLon, destination: LatLon, now: NaiveDateTime) -> Self {
        Self {
            origin,
            destination,
            now,
        }
    }
}

/// One direct way to travel, boarding one trip near the origin and leaving
/// it near the destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedRouteOption {
    pub route: Route,
    pub origin_stop: Stop,
    pub destination_stop: Stop,
    pub trip_id: Option<TripId>,
    pub headsign: Option<String>,
    pub shape_id: Option<ShapeId>,

    /// Departure from the origin stop.
    pub departure: GtfsTime,

    /// Arrival at the destination stop, if the feed gives one.
    pub arrival: Option<GtfsTime>,

    /// Great-circle distance from the requested origin to the boarding stop.
    pub origin_walk_meters: f64,

    /// Great-circle distance from the alighting stop to the destination.
    pub destination_walk_meters: f64,
}

impl SuggestedRouteOption {
    /// Identity used for de-duplication.
    pub fn key(&self) -> (&RouteId, &StopId, &StopId) {
        (&self.route.id, &self.origin_stop.id, &self.destination_stop.id)
    }

    /// Time spent on board, when both times are known.
    pub fn ride_duration(&self) -> Option<Duration> {
        let secs = self.arrival?.seconds_since(self.departure)?;
        Some(Duration::seconds(i64::from(secs)))
    }
}

/// Suggestion search over one feed snapshot.
pub struct Planner<'a> {
    store: &'a FeedStore,
    config: &'a PlannerConfig,
}

impl<'a> Planner<'a> {
    pub fn new(store: &'a FeedStore, config: &'a PlannerConfig) -> Self {
        Self { store, config }
    }

    /// Direct trips from near `request.origin` to near `request.destination`
    /// that leave at or after `request.now`, earliest departure first.
    ///
    /// Checks `cancel` before every trip.
    pub fn suggest(
        &self,
        request: &SuggestRequest,
        cancel: &CancelFlag,
    ) -> Result<Answer<SuggestedRouteOption>, SuggestError> {
        if !self.store.is_ready() {
            return Err(SuggestError::NotReady);
        }

        let radius = self.config.search_radius_meters;
        let near_origin = find_stops_near(self.store.stops(), request.origin, radius);
        if near_origin.is_empty() {
            debug!(origin = ?request.origin, radius, "no stops near origin");
            return Ok(Answer::empty(Advisory::NoStopsNearOrigin));
        }
        let near_destination = find_stops_near(self.store.stops(), request.destination, radius);
        if near_destination.is_empty() {
            debug!(destination = ?request.destination, radius, "no stops near destination");
            return Ok(Answer::empty(Advisory::NoStopsNearDestination));
        }

        let origin_stops: HashMap<&StopId, (&Stop, f64)> = near_origin
            .iter()
            .map(|n| (&n.stop.id, (n.stop, n.distance_meters)))
            .collect();
        let destination_stops: HashMap<&StopId, (&Stop, f64)> = near_destination
            .iter()
            .map(|n| (&n.stop.id, (n.stop, n.distance_meters)))
            .collect();

        let date = request.now.date();
        let now = GtfsTime::from_seconds(request.now.time().num_seconds_from_midnight());

        let mut candidates = Vec::new();
        let mut trips_running = 0usize;
        for trip in self.store.trips() {
            if cancel.is_cancelled() {
                return Err(SuggestError::Cancelled);
            }
            if !self.store.is_service_active(trip, date) {
                continue;
            }
            trips_running += 1;

            let Some(route) = self.store.route(&trip.route_id) else {
                continue;
            };
            let stop_times = self.store.stop_times(&trip.id);
            let Some((board, alight)) =
                direct_leg(stop_times, &origin_stops, &destination_stops, now)
            else {
                continue;
            };

            let (
                Some(&(origin_stop, origin_walk)),
                Some(&(destination_stop, destination_walk)),
                Some(departure),
            ) = (
                origin_stops.get(&board.stop_id),
                destination_stops.get(&alight.stop_id),
                board.boarding_time(),
            )
            else {
                continue;
            };
            candidates.push(SuggestedRouteOption {
                route: route.clone(),
                origin_stop: origin_stop.clone(),
                destination_stop: destination_stop.clone(),
                trip_id: Some(trip.id.clone()),
                headsign: board.headsign.clone().or_else(|| trip.headsign.clone()),
                shape_id: trip.shape_id.clone(),
                departure,
                arrival: alight.alighting_time(),
                origin_walk_meters: origin_walk,
                destination_walk_meters: destination_walk,
            });
        }

        let found = candidates.len();
        let mut options = rank_options(keep_earliest(candidates));
        if let Some(max) = self.config.max_results {
            options.truncate(max);
        }
        debug!(
            %date,
            %now,
            origin_stops = origin_stops.len(),
            destination_stops = destination_stops.len(),
            trips_running,
            found,
            returned = options.len(),
            "direct trip search finished"
        );
        Ok(Answer::or_advise(options, Advisory::NoUpcomingRoutes))
    }
}

/// The boarding and alighting stop times of one trip, if it serves both ends.
///
/// Boarding is the first stop near the origin whose departure (or arrival)
/// is at or after `now`. Alighting is the first stop near the destination
/// strictly later in the sequence. Times are compared as seconds since
/// midnight of the service day, so a trip past 24:00:00 never looks earlier
/// than the current time.
fn direct_leg<'s, T>(
    stop_times: &'s [StopTime],
    origin: &HashMap<&StopId, T>,
    destination: &HashMap<&StopId, T>,
    now: GtfsTime,
) -> Option<(&'s StopTime, &'s StopTime)> {
    let board_at = stop_times.iter().position(|st| {
        origin.contains_key(&st.stop_id) && st.boarding_time().is_some_and(|t| t >= now)
    })?;
    let board = &stop_times[board_at];
    let alight = stop_times[board_at + 1..]
        .iter()
        .find(|st| destination.contains_key(&st.stop_id))?;
    Some((board, alight))
}
