//! GTFS schedule times.
//!
//! GTFS gives arrival and departure times as "HH:MM:SS" measured from noon
//! minus twelve hours on the service day. Trips that run past midnight keep
//! counting, so "25:30:00" is a valid time. We store the total seconds and
//! never wrap.

use std::fmt;

use serde::{Serialize, Serializer};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day on a service day, in seconds. May exceed 24 hours.
///
/// # Examples
///
/// ```
/// use transit_engine::domain::GtfsTime;
///
/// let t = GtfsTime::parse("25:30:00").unwrap();
/// assert_eq!(t.seconds(), 91_800);
/// assert_eq!(t.to_string(), "25:30:00");
///
/// // Single-digit hours are allowed by GTFS
/// assert_eq!(GtfsTime::parse("8:05:00").unwrap().seconds(), 29_100);
///
/// assert!(GtfsTime::parse("08:60:00").is_err());
/// assert!(GtfsTime::parse("0800").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GtfsTime(u32);

impl GtfsTime {
    /// Build a time from seconds past the start of the service day.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Build a time from hour, minute and second components.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse "H:MM:SS" or "HH:MM:SS". Hours are not capped at 23.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        if h.is_empty() || h.len() > 3 || !h.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new("invalid hour digits"));
        }
        let hours: u32 = h
            .parse()
            .map_err(|_| TimeError::new("invalid hour digits"))?;

        let minutes =
            parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds =
            parse_two_digits(sec.as_bytes()).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Total seconds since the start of the service day.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    pub fn hours(&self) -> u32 {
        self.0 / 3600
    }

    pub fn minutes(&self) -> u32 {
        (self.0 / 60) % 60
    }

    /// Seconds elapsed from `earlier` to `self`, or `None` if `earlier` is later.
    pub fn seconds_since(&self, earlier: GtfsTime) -> Option<u32> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.0 % 60
        )
    }
}

impl Serialize for GtfsTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any well-formed time parses to H*3600 + M*60 + S.
        #[test]
        fn parses_to_total_seconds(h in 0u32..48, m in 0u32..60, s in 0u32..60) {
            let text = format!("{h:02}:{m:02}:{s:02}");
            let t = GtfsTime::parse(&text).unwrap();
            prop_assert_eq!(t.seconds(), h * 3600 + m * 60 + s);
            prop_assert_eq!(t.to_string(), text);
        }

        /// Ordering of parsed times matches ordering of their seconds.
        #[test]
        fn ordering_matches_seconds(a in 0u32..200_000, b in 0u32..200_000) {
            let ta = GtfsTime::from_seconds(a);
            let tb = GtfsTime::from_seconds(b);
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        }
    }
}
