//! Stops and geographic coordinates.

use std::sync::OnceLock;

use geo::Point;
use serde::{Serialize, Serializer};

use super::StopId;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse a pair of raw feed values. Rejects non-finite and out-of-range
    /// coordinates.
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        let point = Self { lat, lon };
        point.is_valid().then_some(point)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<LatLon> for Point {
    fn from(value: LatLon) -> Self {
        Point::new(value.lon, value.lat)
    }
}

/// A stop from stops.txt.
///
/// Coordinates are kept as the raw text from the feed and parsed on first
/// use; most stops are never looked at by a given query.
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: StopId,
    pub code: Option<String>,
    pub name: String,
    pub raw_lat: Option<String>,
    pub raw_lon: Option<String>,
    pub location_type: Option<u8>,
    pub parent_station: Option<StopId>,
    location: OnceLock<Option<LatLon>>,
}

impl Stop {
    pub fn new(id: StopId, name: impl Into<String>) -> Self {
        Self {
            id,
            code: None,
            name: name.into(),
            raw_lat: None,
            raw_lon: None,
            location_type: None,
            parent_station: None,
            location: OnceLock::new(),
        }
    }

    pub fn with_coordinates(mut self, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        self.raw_lat = Some(lat.into());
        self.raw_lon = Some(lon.into());
        self.location = OnceLock::new();
        self
    }

    /// Stand-in for a stop id that stop_times references but stops.txt lacks.
    pub fn placeholder(id: StopId) -> Self {
        let name = format!("Unknown stop {id}");
        Self::new(id, name)
    }

    /// Name used when stops.txt leaves `stop_name` blank.
    pub fn unnamed(id: &StopId) -> String {
        format!("Stop {id}")
    }

    /// Parsed coordinates, or `None` if absent or unparsable.
    pub fn location(&self) -> Option<LatLon> {
        *self.location.get_or_init(|| {
            let (lat, lon) = (self.raw_lat.as_deref()?, self.raw_lon.as_deref()?);
            LatLon::parse(lat, lon)
        })
    }
}

// The memoised location is derived from the raw fields, so it takes no part
// in equality.
impl PartialEq for Stop {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.code == other.code
            && self.name == other.name
            && self.raw_lat == other.raw_lat
            && self.raw_lon == other.raw_lon
            && self.location_type == other.location_type
            && self.parent_station == other.parent_station
    }
}

impl Serialize for Stop {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Stop", 5)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("code", &self.code)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("location", &self.location())?;
        s.serialize_field("parent_station", &self.parent_station)?;
        s.end()
    }
}
