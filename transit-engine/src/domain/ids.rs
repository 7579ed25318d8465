//! Identifier types for feed entities.
//!
//! GTFS identifiers are opaque strings scoped to their own table, so each
//! table gets a distinct newtype. Mixing a stop id into a trip lookup is
//! then a compile error rather than a silent miss.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! feed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as it appears in the feed.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

feed_id!(
    /// `route_id` from routes.txt.
    RouteId
);
feed_id!(
    /// `trip_id` from trips.txt.
    TripId
);
feed_id!(
    /// `stop_id` from stops.txt.
    StopId
);
feed_id!(
    /// `service_id` shared by trips.txt, calendar.txt and calendar_dates.txt.
    ServiceId
);
feed_id!(
    /// `shape_id` shared by trips.txt and shapes.txt.
    ShapeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_id() {
        assert_eq!(StopId::new("1001").to_string(), "1001");
    }

    #[test]
    fn debug_names_the_table() {
        assert_eq!(format!("{:?}", TripId::from("T1")), "TripId(T1)");
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&RouteId::new("R1")).unwrap();
        assert_eq!(json, "\"R1\"");
    }
}
