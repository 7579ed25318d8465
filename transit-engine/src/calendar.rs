//! Service calendar evaluation.
//!
//! Combines calendar.txt (weekly pattern over a date range) with
//! calendar_dates.txt (per-date additions and removals). Exceptions always
//! win over the weekly pattern.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tracing::trace;

use crate::domain::ServiceId;

/// Date format used by calendar.txt and calendar_dates.txt.
pub const GTFS_DATE_FORMAT: &str = "%Y%m%d";

/// Parse a "YYYYMMDD" date.
pub fn parse_gtfs_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), GTFS_DATE_FORMAT).ok()
}

/// Compact representation of which weekdays a service runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DaysOfWeek {
    flags: u8,
}

impl DaysOfWeek {
    pub fn from_bools(mon: bool, tue: bool, wed: bool, thu: bool, fri: bool, sat: bool, sun: bool) -> Self {
        let mut days = Self::default();
        for (weekday, runs) in [
            (Weekday::Mon, mon),
            (Weekday::Tue, tue),
            (Weekday::Wed, wed),
            (Weekday::Thu, thu),
            (Weekday::Fri, fri),
            (Weekday::Sat, sat),
            (Weekday::Sun, sun),
        ] {
            if runs {
                days.set(weekday);
            }
        }
        days
    }

    pub fn set(&mut self, weekday: Weekday) {
        self.flags |= 1 << weekday.num_days_from_monday();
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.flags & (1 << weekday.num_days_from_monday()) != 0
    }

    pub fn includes(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    /// Short description for display, e.g. "weekdays" or "MWF".
    pub fn describe(&self) -> String {
        let weekdays = (self.flags & 0b001_1111).count_ones();
        let weekends = (self.flags & 0b110_0000).count_ones();
        match (weekdays, weekends) {
            (5, 2) => return "every day".to_string(),
            (5, 0) => return "weekdays".to_string(),
            (0, 2) => return "weekends".to_string(),
            (0, 0) => return "exceptions only".to_string(),
            _ => {}
        }
        let mut result = String::new();
        for (day, weekday) in [
            ("M", Weekday::Mon),
            ("T", Weekday::Tue),
            ("W", Weekday::Wed),
            ("Th", Weekday::Thu),
            ("F", Weekday::Fri),
            ("Sat", Weekday::Sat),
            ("Sun", Weekday::Sun),
        ] {
            if self.contains(weekday) {
                result.push_str(day);
            }
        }
        result
    }
}

/// A row of calendar.txt.
///
/// Dates that failed to parse are kept as `None`; such a record never
/// matches any date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarItem {
    pub service_id: ServiceId,
    pub days: DaysOfWeek,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// `exception_type` from calendar_dates.txt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    /// 1: service added for the date.
    Added,
    /// 2: service removed for the date.
    Removed,
}

impl ExceptionType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ExceptionType::Added),
            2 => Some(ExceptionType::Removed),
            _ => None,
        }
    }
}

/// A row of calendar_dates.txt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarException {
    pub service_id: ServiceId,
    pub date: Option<NaiveDate>,
    pub exception_type: ExceptionType,
}

/// All calendars and calendar exceptions, indexed by service id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCalendar {
    items: HashMap<ServiceId, CalendarItem>,
    exceptions: HashMap<ServiceId, Vec<CalendarException>>,
}

impl ServiceCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a calendar item. Returns `false` (and keeps the existing item)
    /// if the service already has one.
    pub fn insert_item(&mut self, item: CalendarItem) -> bool {
        if self.items.contains_key(&item.service_id) {
            return false;
        }
        self.items.insert(item.service_id.clone(), item);
        true
    }

    pub fn insert_exception(&mut self, exception: CalendarException) {
        self.exceptions
            .entry(exception.service_id.clone())
            .or_default()
            .push(exception);
    }

    pub fn item(&self, service_id: &ServiceId) -> Option<&CalendarItem> {
        self.items.get(service_id)
    }

    pub fn exceptions(&self, service_id: &ServiceId) -> &[CalendarException] {
        self.exceptions
            .get(service_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.values().map(Vec::len).sum()
    }

    /// Number of distinct service ids mentioned by either table.
    pub fn service_count(&self) -> usize {
        self.items.len()
            + self
                .exceptions
                .keys()
                .filter(|id| !self.items.contains_key(*id))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.exceptions.is_empty()
    }

    /// Decide whether `service_id` runs on `date`.
    ///
    /// 1. A calendar_dates exception for the date decides outright.
    /// 2. Otherwise the service needs a calendar item whose range contains
    ///    the date (inclusive) and whose weekday flag is set.
    pub fn is_service_active(&self, service_id: &ServiceId, date: NaiveDate) -> bool {
        if let Some(exception) = self
            .exceptions(service_id)
            .iter()
            .find(|e| e.date == Some(date))
        {
            return exception.exception_type == ExceptionType::Added;
        }

        let Some(item) = self.items.get(service_id) else {
            return false;
        };

        let (Some(start), Some(end)) = (item.start_date, item.end_date) else {
            trace!(service = %service_id, "calendar item has unparsable dates, treating as inactive");
            return false;
        };

        if date < start || date > end {
            return false;
        }

        item.days.includes(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekday_calendar() -> ServiceCalendar {
        let mut calendar = ServiceCalendar::new();
        calendar.insert_item(CalendarItem {
            service_id: ServiceId::new("WK"),
            days: DaysOfWeek::from_bools(true, true, true, true, true, false, false),
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 12, 31)),
        });
        calendar
    }

    #[test]
    fn parse_dates() {
        assert_eq!(parse_gtfs_date("20240315"), Some(date(2024, 3, 15)));
        assert_eq!(parse_gtfs_date("2024-03-15"), None);
        assert_eq!(parse_gtfs_date("20241345"), None);
    }

    #[test]
    fn weekly_pattern() {
        let calendar = weekday_calendar();
        let wk = ServiceId::new("WK");
        assert!(calendar.is_service_active(&wk, date(2024, 1, 2))); // Tuesday
        assert!(!calendar.is_service_active(&wk, date(2024, 1, 6))); // Saturday
    }

    #[test]
    fn range_is_inclusive() {
        let calendar = weekday_calendar();
        let wk = ServiceId::new("WK");
        assert!(calendar.is_service_active(&wk, date(2024, 1, 1))); // Monday, first day
        assert!(calendar.is_service_active(&wk, date(2024, 12, 31))); // Tuesday, last day
        assert!(!calendar.is_service_active(&wk, date(2025, 1, 1)));
        assert!(!calendar.is_service_active(&wk, date(2023, 12, 29)));
    }

    #[test]
    fn added_exception_outside_pattern() {
        let mut calendar = weekday_calendar();
        calendar.insert_exception(CalendarException {
            service_id: ServiceId::new("WK"),
            date: Some(date(2024, 1, 6)),
            exception_type: ExceptionType::Added,
        });
        assert!(calendar.is_service_active(&ServiceId::new("WK"), date(2024, 1, 6)));
    }

    #[test]
    fn removed_exception_inside_pattern() {
        let mut calendar = weekday_calendar();
        calendar.insert_exception(CalendarException {
            service_id: ServiceId::new("WK"),
            date: Some(date(2024, 1, 1)),
            exception_type: ExceptionType::Removed,
        });
        assert!(!calendar.is_service_active(&ServiceId::new("WK"), date(2024, 1, 1)));
        assert!(calendar.is_service_active(&ServiceId::new("WK"), date(2024, 1, 2)));
    }

    #[test]
    fn exception_only_service() {
        let mut calendar = ServiceCalendar::new();
        calendar.insert_exception(CalendarException {
            service_id: ServiceId::new("XMAS"),
            date: Some(date(2024, 12, 25)),
            exception_type: ExceptionType::Added,
        });
        assert!(calendar.is_service_active(&ServiceId::new("XMAS"), date(2024, 12, 25)));
        assert!(!calendar.is_service_active(&ServiceId::new("XMAS"), date(2024, 12, 26)));
        assert_eq!(calendar.service_count(), 1);
    }

    #[test]
    fn unknown_service_is_inactive() {
        let calendar = weekday_calendar();
        assert!(!calendar.is_service_active(&ServiceId::new("NOPE"), date(2024, 1, 2)));
    }

    #[test]
    fn unparsable_dates_never_match() {
        let mut calendar = ServiceCalendar::new();
        calendar.insert_item(CalendarItem {
            service_id: ServiceId::new("BAD"),
            days: DaysOfWeek::from_bools(true, true, true, true, true, true, true),
            start_date: None,
            end_date: Some(date(2099, 12, 31)),
        });
        calendar.insert_exception(CalendarException {
            service_id: ServiceId::new("BAD"),
            date: None,
            exception_type: ExceptionType::Added,
        });
        assert!(!calendar.is_service_active(&ServiceId::new("BAD"), date(2024, 1, 2)));
    }

    #[test]
    fn duplicate_item_keeps_first() {
        let mut calendar = weekday_calendar();
        let inserted = calendar.insert_item(CalendarItem {
            service_id: ServiceId::new("WK"),
            days: DaysOfWeek::default(),
            start_date: None,
            end_date: None,
        });
        assert!(!inserted);
        assert!(calendar.is_service_active(&ServiceId::new("WK"), date(2024, 1, 2)));
    }

    #[test]
    fn describe_days() {
        assert_eq!(
            DaysOfWeek::from_bools(true, true, true, true, true, false, false).describe(),
            "weekdays"
        );
        assert_eq!(
            DaysOfWeek::from_bools(false, false, false, false, false, true, true).describe(),
            "weekends"
        );
        assert_eq!(
            DaysOfWeek::from_bools(true, true, true, true, true, true, true).describe(),
            "every day"
        );
        assert_eq!(
            DaysOfWeek::from_bools(true, false, true, false, true, false, false).describe(),
            "MWF"
        );
        assert_eq!(DaysOfWeek::default().describe(), "exceptions only");
    }
}
