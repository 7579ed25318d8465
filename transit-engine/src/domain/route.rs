//! Routes and route types.

use std::fmt;

use serde::{Serialize, Serializer};

use super::RouteId;

/// The basic GTFS `route_type` codes.
///
/// Extended (HVT) codes such as 700 are kept as `Other` so they survive a
/// round trip through the store, but get a generic label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteType {
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableTram,
    AerialLift,
    Funicular,
    Other(u16),
}

impl RouteType {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => RouteType::Tram,
            1 => RouteType::Subway,
            2 => RouteType::Rail,
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            5 => RouteType::CableTram,
            6 => RouteType::AerialLift,
            7 => RouteType::Funicular,
            other => RouteType::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            RouteType::Tram => 0,
            RouteType::Subway => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableTram => 5,
            RouteType::AerialLift => 6,
            RouteType::Funicular => 7,
            RouteType::Other(code) => *code,
        }
    }

    /// Human readable label for display next to a route name.
    pub fn label(&self) -> &'static str {
        match self {
            RouteType::Tram => "Tram",
            RouteType::Subway => "Subway",
            RouteType::Rail => "Rail",
            RouteType::Bus => "Bus",
            RouteType::Ferry => "Ferry",
            RouteType::CableTram => "Cable tram",
            RouteType::AerialLift => "Aerial lift",
            RouteType::Funicular => "Funicular",
            RouteType::Other(_) => "Transit",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for RouteType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// A route from routes.txt, after display-name de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub id: RouteId,
    pub agency_id: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub route_type: Option<RouteType>,
}

impl Route {
    /// Key used to collapse routes that present identically to a rider:
    /// `shortName|longName|agencyId|routeType`, absent fields as "".
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.short_name.as_deref().unwrap_or(""),
            self.long_name.as_deref().unwrap_or(""),
            self.agency_id.as_deref().unwrap_or(""),
            self.route_type
                .map(|t| t.code().to_string())
                .unwrap_or_default()
        )
    }

    /// Short name, else long name, else the raw id.
    pub fn display_name(&self) -> &str {
        [&self.short_name, &self.long_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
            .unwrap_or(self.id.as_str())
    }

    /// Case-insensitive substring match on short and long name.
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        [&self.short_name, &self.long_name]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(short: Option<&str>, long: Option<&str>) -> Route {
        Route {
            id: RouteId::new("R1"),
            agency_id: None,
            short_name: short.map(String::from),
            long_name: long.map(String::from),
            route_type: Some(RouteType::Bus),
        }
    }

    #[test]
    fn route_type_codes_roundtrip() {
        for code in 0..8 {
            assert_eq!(RouteType::from_code(code).code(), code);
        }
        assert_eq!(RouteType::from_code(700), RouteType::Other(700));
        assert_eq!(RouteType::from_code(700).code(), 700);
    }

    #[test]
    fn route_type_labels() {
        assert_eq!(RouteType::Bus.to_string(), "Bus");
        assert_eq!(RouteType::from_code(6).label(), "Aerial lift");
        assert_eq!(RouteType::Other(1100).label(), "Transit");
    }

    #[test]
    fn dedup_key_uses_empty_for_absent_fields() {
        assert_eq!(route(Some("11A"), None).dedup_key(), "11A|||3");
        let mut r = route(None, Some("Outer Circle"));
        r.agency_id = Some("NX".into());
        r.route_type = None;
        assert_eq!(r.dedup_key(), "|Outer Circle|NX|");
    }

    #[test]
    fn display_name_falls_back() {
        assert_eq!(route(Some("11A"), Some("Outer Circle")).display_name(), "11A");
        assert_eq!(route(Some(""), Some("Outer Circle")).display_name(), "Outer Circle");
        assert_eq!(route(None, None).display_name(), "R1");
    }

    #[test]
    fn matches_is_case_insensitive() {
        let r = route(Some("11A"), Some("Outer Circle"));
        assert!(r.matches_lowercase("11a"));
        assert!(r.matches_lowercase("circle"));
        assert!(!r.matches_lowercase("inner"));
    }
}
