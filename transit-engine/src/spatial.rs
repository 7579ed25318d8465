//! Great-circle distance and nearest-stop search.
//!
//! Feed sizes in scope (tens of thousands of stops) make a linear scan
//! cheap enough per query, so there is no prebuilt index.

use geo::{Distance, HaversineMeasure, Point};

use crate::domain::{LatLon, Stop};

/// Mean Earth radius used for all distance calculations, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two coordinates in meters.
///
/// NaN when either coordinate is not a number.
pub fn haversine_meters(a: LatLon, b: LatLon) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_METERS).distance(Point::from(a), Point::from(b))
}

/// A stop within the search radius, with its distance from the query point.
#[derive(Debug, Clone, Copy)]
pub struct NearbyStop<'a> {
    pub stop: &'a Stop,
    pub distance_meters: f64,
}

/// All stops within `radius_meters` of `point`, nearest first.
///
/// Stops with absent or unparsable coordinates are skipped.
pub fn find_stops_near<'a>(
    stops: impl IntoIterator<Item = &'a Stop>,
    point: LatLon,
    radius_meters: f64,
) -> Vec<NearbyStop<'a>> {
    let mut nearby: Vec<NearbyStop<'a>> = stops
        .into_iter()
        .filter_map(|stop| {
            let location = stop.location()?;
            let distance_meters = haversine_meters(point, location);
            (distance_meters <= radius_meters).then_some(NearbyStop {
                stop,
                distance_meters,
            })
        })
        .collect();
    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopId;

    fn stop(id: &str, lat: &str, lon: &str) -> Stop {
        Stop::new(StopId::new(id), id).with_coordinates(lat, lon)
    }

    #[test]
    fn zero_distance_to_self() {
        let p = LatLon::new(52.48, -1.90);
        assert_eq!(haversine_meters(p, p), 0.0);
    }

    #[test]
    fn known_distance() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(1.0, 0.0);
        let d = haversine_meters(a, b);
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn nan_coordinates_have_no_distance() {
        let p = LatLon::new(52.48, -1.90);
        assert!(haversine_meters(LatLon::new(f64::NAN, f64::NAN), p).is_nan());
        assert!(haversine_meters(p, LatLon::new(52.48, f64::NAN)).is_nan());
    }

    #[test]
    fn finds_only_stops_in_radius() {
        let stops = vec![
            stop("A", "52.4800", "-1.9000"),
            stop("B", "52.4850", "-1.9000"), // ~556 m north
            stop("C", "52.5000", "-1.8900"), // ~2.3 km away
        ];
        let found = find_stops_near(&stops, LatLon::new(52.48, -1.90), 1000.0);
        let ids: Vec<&str> = found.iter().map(|n| n.stop.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(found[1].distance_meters > 500.0 && found[1].distance_meters < 600.0);
    }

    #[test]
    fn skips_stops_without_coordinates() {
        let stops = vec![
            Stop::new(StopId::new("NOLOC"), "No location"),
            stop("BAD", "x", "y"),
            stop("A", "52.48", "-1.90"),
        ];
        let found = find_stops_near(&stops, LatLon::new(52.48, -1.90), 1000.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stop.id.as_str(), "A");
    }

    #[test]
    fn empty_when_nothing_near() {
        let stops = vec![stop("A", "52.48", "-1.90")];
        assert!(find_stops_near(&stops, LatLon::new(40.0, -74.0), 1000.0).is_empty());
    }
}
