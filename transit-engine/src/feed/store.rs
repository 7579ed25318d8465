//! The immutable feed snapshot.
//!
//! A `FeedStore` is built once by the builder and never mutated after that.
//! A refresh builds a whole new store and swaps it in.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::ServiceCalendar;
use crate::domain::{Route, RouteId, Stop, StopId, StopTime, Trip, TripId};

/// Entity counts for a loaded feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    pub routes: usize,
    pub trips: usize,
    pub stops: usize,
    pub stop_times: usize,
    pub services: usize,
}

/// Routes, trips, stops, stop times and calendars of one feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedStore {
    /// De-duplicated routes in file order.
    pub(crate) routes: Vec<Route>,
    pub(crate) route_index: HashMap<RouteId, usize>,
    /// Collapsed route id -> canonical route id.
    pub(crate) route_aliases: HashMap<RouteId, RouteId>,
    /// Trips in file order.
    pub(crate) trips: Vec<Trip>,
    pub(crate) trip_index: HashMap<TripId, usize>,
    pub(crate) stops: HashMap<StopId, Stop>,
    /// Per trip, sorted by ascending stop_sequence.
    pub(crate) stop_times: HashMap<TripId, Vec<StopTime>>,
    pub(crate) calendar: ServiceCalendar,
}

impl FeedStore {
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Look up a route, following de-duplication aliases.
    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        let canonical = self.route_aliases.get(id).unwrap_or(id);
        self.route_index.get(canonical).map(|&i| &self.routes[i])
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.trip_index.get(id).map(|&i| &self.trips[i])
    }

    /// Trips whose route resolves to `route_id`, in file order.
    pub fn trips_for_route<'a>(&'a self, route_id: &'a RouteId) -> impl Iterator<Item = &'a Trip> {
        let canonical = self.route(route_id).map(|r| &r.id);
        self.trips.iter().filter(move |trip| {
            canonical.is_some_and(|id| self.route(&trip.route_id).is_some_and(|r| &r.id == id))
        })
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// The stop for `id`, or a placeholder if stops.txt never defined it.
    pub fn stop_or_placeholder(&self, id: &StopId) -> Cow<'_, Stop> {
        match self.stops.get(id) {
            Some(stop) => Cow::Borrowed(stop),
            None => Cow::Owned(Stop::placeholder(id.clone())),
        }
    }

    /// Stop times of a trip in ascending sequence order.
    pub fn stop_times(&self, trip_id: &TripId) -> &[StopTime] {
        self.stop_times
            .get(trip_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn calendar(&self) -> &ServiceCalendar {
        &self.calendar
    }

    pub fn is_service_active(&self, trip: &Trip, date: NaiveDate) -> bool {
        self.calendar.is_service_active(&trip.service_id, date)
    }

    /// Whether every collection a query needs has content.
    pub fn is_ready(&self) -> bool {
        !self.routes.is_empty()
            && !self.trips.is_empty()
            && !self.stops.is_empty()
            && !self.stop_times.is_empty()
            && !self.calendar.is_empty()
    }

    pub fn summary(&self) -> FeedSummary {
        FeedSummary {
            routes: self.routes.len(),
            trips: self.trips.len(),
            stops: self.stops.len(),
            stop_times: self.stop_times.values().map(Vec::len).sum(),
            services: self.calendar.service_count(),
        }
    }
}
