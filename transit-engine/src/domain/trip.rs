//! Trips and their scheduled stop visits.

use serde::Serialize;

use super::{GtfsTime, RouteId, ServiceId, ShapeId, StopId, TripId};

/// A trip from trips.txt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub service_id: ServiceId,
    pub headsign: Option<String>,
    pub direction_id: Option<u8>,
    pub shape_id: Option<ShapeId>,
}

/// One scheduled visit of a trip to a stop, from stop_times.txt.
///
/// # Time Semantics
///
/// GTFS only requires times at timepoints; intermediate stops may leave both
/// blank. Boarding uses the departure and falls back to the arrival;
/// alighting does the opposite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopTime {
    pub trip_id: TripId,
    pub arrival: Option<GtfsTime>,
    pub departure: Option<GtfsTime>,
    pub stop_id: StopId,
    pub sequence: u32,
    pub headsign: Option<String>,
}

impl StopTime {
    /// Time a rider can board here.
    pub fn boarding_time(&self) -> Option<GtfsTime> {
        self.departure.or(self.arrival)
    }

    /// Time a rider gets off here.
    pub fn alighting_time(&self) -> Option<GtfsTime> {
        self.arrival.or(self.departure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(arr: Option<&str>, dep: Option<&str>) -> StopTime {
        StopTime {
            trip_id: TripId::new("T1"),
            arrival: arr.map(|s| GtfsTime::parse(s).unwrap()),
            departure: dep.map(|s| GtfsTime::parse(s).unwrap()),
            stop_id: StopId::new("A"),
            sequence: 1,
            headsign: None,
        }
    }

    #[test]
    fn boarding_prefers_departure() {
        let st = stop_time(Some("08:00:00"), Some("08:02:00"));
        assert_eq!(st.boarding_time().unwrap().to_string(), "08:02:00");
        assert_eq!(st.alighting_time().unwrap().to_string(), "08:00:00");
    }

    #[test]
    fn times_fall_back_to_each_other() {
        let arrival_only = stop_time(Some("08:15:00"), None);
        assert_eq!(arrival_only.boarding_time().unwrap().to_string(), "08:15:00");

        let departure_only = stop_time(None, Some("08:00:00"));
        assert_eq!(departure_only.alighting_time().unwrap().to_string(), "08:00:00");

        assert_eq!(stop_time(None, None).boarding_time(), None);
    }
}
