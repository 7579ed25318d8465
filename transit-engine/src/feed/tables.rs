//! Row conversion for each GTFS table.
//!
//! Each `*_from_row` function turns one reader row into a domain value, or
//! explains why the row has to be skipped.

use tracing::warn;

use crate::calendar::{CalendarException, CalendarItem, DaysOfWeek, ExceptionType, parse_gtfs_date};
use crate::domain::{
    GtfsTime, LatLon, Route, RouteId, RouteType, ServiceId, ShapeId, Stop, StopId, StopTime, Trip,
    TripId,
};

use super::reader::{Row, RowError};

pub const ROUTES: &str = "routes.txt";
pub const TRIPS: &str = "trips.txt";
pub const STOPS: &str = "stops.txt";
pub const STOP_TIMES: &str = "stop_times.txt";
pub const CALENDAR: &str = "calendar.txt";
pub const CALENDAR_DATES: &str = "calendar_dates.txt";
pub const SHAPES: &str = "shapes.txt";

pub const ROUTES_REQUIRED: &[&str] = &["route_id"];
pub const TRIPS_REQUIRED: &[&str] = &["route_id", "service_id", "trip_id"];
pub const STOPS_REQUIRED: &[&str] = &["stop_id"];
pub const STOP_TIMES_REQUIRED: &[&str] = &["trip_id", "stop_id", "stop_sequence"];
pub const CALENDAR_REQUIRED: &[&str] = &[
    "service_id",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "start_date",
    "end_date",
];
pub const CALENDAR_DATES_REQUIRED: &[&str] = &["service_id", "date", "exception_type"];
pub const SHAPES_REQUIRED: &[&str] = &["shape_id", "shape_pt_lat", "shape_pt_lon", "shape_pt_sequence"];

pub fn route_from_row(row: &Row) -> Result<Route, RowError> {
    Ok(Route {
        id: RouteId::new(row.require("route_id")?),
        agency_id: row.text("agency_id"),
        short_name: row.text("route_short_name"),
        long_name: row.text("route_long_name"),
        route_type: row.parse::<u16>("route_type")?.map(RouteType::from_code),
    })
}

pub fn trip_from_row(row: &Row) -> Result<Trip, RowError> {
    Ok(Trip {
        id: TripId::new(row.require("trip_id")?),
        route_id: RouteId::new(row.require("route_id")?),
        service_id: ServiceId::new(row.require("service_id")?),
        headsign: row.text("trip_headsign"),
        direction_id: row.parse("direction_id")?,
        shape_id: row.get("shape_id").map(ShapeId::new),
    })
}

pub fn stop_from_row(row: &Row) -> Result<Stop, RowError> {
    let id = StopId::new(row.require("stop_id")?);
    let name = row.text("stop_name").unwrap_or_else(|| Stop::unnamed(&id));
    let mut stop = Stop::new(id, name);
    stop.code = row.text("stop_code");
    stop.location_type = row.parse("location_type")?;
    stop.parent_station = row.get("parent_station").map(StopId::new);
    if let (Some(lat), Some(lon)) = (row.get("stop_lat"), row.get("stop_lon")) {
        stop = stop.with_coordinates(lat, lon);
    }
    Ok(stop)
}

pub fn stop_time_from_row(row: &Row) -> Result<StopTime, RowError> {
    Ok(StopTime {
        trip_id: TripId::new(row.require("trip_id")?),
        arrival: parse_time(row, "arrival_time")?,
        departure: parse_time(row, "departure_time")?,
        stop_id: StopId::new(row.require("stop_id")?),
        sequence: row.parse_required("stop_sequence")?,
        headsign: row.text("stop_headsign"),
    })
}

fn parse_time(row: &Row, column: &'static str) -> Result<Option<GtfsTime>, RowError> {
    row.get(column)
        .map(|value| {
            GtfsTime::parse(value).map_err(|_| RowError::Invalid {
                column,
                value: value.to_string(),
            })
        })
        .transpose()
}

pub fn calendar_item_from_row(row: &Row) -> Result<CalendarItem, RowError> {
    let service_id = ServiceId::new(row.require("service_id")?);
    let days = DaysOfWeek::from_bools(
        parse_flag(row, "monday")?,
        parse_flag(row, "tuesday")?,
        parse_flag(row, "wednesday")?,
        parse_flag(row, "thursday")?,
        parse_flag(row, "friday")?,
        parse_flag(row, "saturday")?,
        parse_flag(row, "sunday")?,
    );
    let start_date = parse_date(row, "start_date", &service_id);
    let end_date = parse_date(row, "end_date", &service_id);
    Ok(CalendarItem {
        service_id,
        days,
        start_date,
        end_date,
    })
}

pub fn calendar_exception_from_row(row: &Row) -> Result<CalendarException, RowError> {
    let service_id = ServiceId::new(row.require("service_id")?);
    let code: u8 = row.parse_required("exception_type")?;
    let exception_type = ExceptionType::from_code(code).ok_or_else(|| RowError::Invalid {
        column: "exception_type",
        value: code.to_string(),
    })?;
    let date = parse_date(row, "date", &service_id);
    Ok(CalendarException {
        service_id,
        date,
        exception_type,
    })
}

fn parse_flag(row: &Row, column: &'static str) -> Result<bool, RowError> {
    match row.require(column)? {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(RowError::Invalid {
            column,
            value: other.to_string(),
        }),
    }
}

/// Unparsable dates are kept as `None` so the record never matches, rather
/// than dropping the whole record.
fn parse_date(
    row: &Row,
    column: &'static str,
    service_id: &ServiceId,
) -> Option<chrono::NaiveDate> {
    let raw = row.get(column);
    let date = raw.and_then(parse_gtfs_date);
    if date.is_none() {
        warn!(
            service = %service_id,
            column,
            value = raw.unwrap_or(""),
            line = row.line(),
            "unparsable calendar date, record will never match"
        );
    }
    date
}

/// A row of shapes.txt, read only while extracting one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePoint {
    pub location: LatLon,
    pub sequence: u32,
    pub dist_traveled: Option<f64>,
}

pub fn shape_point_from_row(row: &Row) -> Result<ShapePoint, RowError> {
    let lat: f64 = row.parse_required("shape_pt_lat")?;
    let lon: f64 = row.parse_required("shape_pt_lon")?;
    let location = LatLon::new(lat, lon);
    if !location.is_valid() {
        return Err(RowError::Invalid {
            column: "shape_pt_lat",
            value: format!("{lat},{lon}"),
        });
    }
    Ok(ShapePoint {
        location,
        sequence: row.parse_required("shape_pt_sequence")?,
        dist_traveled: row.parse("shape_dist_traveled")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::reader::{TableReader, Volume};

    fn first_row(text: &str) -> Row {
        TableReader::from_reader(text.as_bytes(), "test.txt", &[], Volume::Low)
            .unwrap()
            .next_row()
            .unwrap()
    }

    #[test]
    fn route_row() {
        let row = first_row(
            "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,NX,11A,Outer Circle,3\n",
        );
        let route = route_from_row(&row).unwrap();
        assert_eq!(route.id, RouteId::new("R1"));
        assert_eq!(route.agency_id.as_deref(), Some("NX"));
        assert_eq!(route.short_name.as_deref(), Some("11A"));
        assert_eq!(route.long_name.as_deref(), Some("Outer Circle"));
        assert_eq!(route.route_type, Some(RouteType::Bus));
    }

    #[test]
    fn route_row_bad_type_is_rejected() {
        let row = first_row("route_id,route_type\nR1,bus\n");
        assert!(route_from_row(&row).is_err());
    }

    #[test]
    fn trip_row_optional_fields() {
        let row = first_row("route_id,service_id,trip_id\nR1,S1,T1\n");
        let trip = trip_from_row(&row).unwrap();
        assert_eq!(trip.id, TripId::new("T1"));
        assert_eq!(trip.headsign, None);
        assert_eq!(trip.direction_id, None);
        assert_eq!(trip.shape_id, None);
    }

    #[test]
    fn stop_row_defaults_name() {
        let row = first_row("stop_id,stop_lat,stop_lon\nS1,52.48,-1.90\n");
        let stop = stop_from_row(&row).unwrap();
        assert_eq!(stop.name, "Stop S1");
        assert_eq!(stop.location(), Some(LatLon::new(52.48, -1.90)));
    }

    #[test]
    fn stop_row_keeps_bad_coordinates_as_text() {
        let row = first_row("stop_id,stop_name,stop_lat,stop_lon\nS1,Main,abc,-1.90\n");
        let stop = stop_from_row(&row).unwrap();
        assert_eq!(stop.raw_lat.as_deref(), Some("abc"));
        assert_eq!(stop.location(), None);
    }

    #[test]
    fn stop_time_row() {
        let row = first_row(
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,,25:30:00,A,7\n",
        );
        let st = stop_time_from_row(&row).unwrap();
        assert_eq!(st.arrival, None);
        assert_eq!(st.departure.unwrap().seconds(), 91_800);
        assert_eq!(st.sequence, 7);
    }

    #[test]
    fn stop_time_row_rejects_bad_values() {
        let bad_seq = first_row("trip_id,stop_id,stop_sequence\nT1,A,first\n");
        assert!(stop_time_from_row(&bad_seq).is_err());

        let bad_time = first_row("trip_id,arrival_time,stop_id,stop_sequence\nT1,8am,A,1\n");
        assert!(stop_time_from_row(&bad_time).is_err());
    }

    #[test]
    fn calendar_row() {
        let row = first_row(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nS1,1,0,0,0,0,0,0,20200101,20991231\n",
        );
        let item = calendar_item_from_row(&row).unwrap();
        assert_eq!(item.days.describe(), "M");
        assert_eq!(item.start_date, parse_gtfs_date("20200101"));
        assert_eq!(item.end_date, parse_gtfs_date("20991231"));
    }

    #[test]
    fn calendar_row_keeps_unparsable_dates() {
        let row = first_row(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nS1,1,1,1,1,1,0,0,soon,20991231\n",
        );
        let item = calendar_item_from_row(&row).unwrap();
        assert_eq!(item.start_date, None);
    }

    #[test]
    fn calendar_row_rejects_bad_flags() {
        let row = first_row(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nS1,yes,0,0,0,0,0,0,20200101,20991231\n",
        );
        assert!(calendar_item_from_row(&row).is_err());
    }

    #[test]
    fn calendar_exception_rows() {
        let row = first_row("service_id,date,exception_type\nS1,20240101,2\n");
        let exception = calendar_exception_from_row(&row).unwrap();
        assert_eq!(exception.exception_type, ExceptionType::Removed);

        let row = first_row("service_id,date,exception_type\nS1,20240101,3\n");
        assert!(calendar_exception_from_row(&row).is_err());
    }

    #[test]
    fn shape_point_row() {
        let row = first_row(
            "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled\nSH1,52.48,-1.90,3,120.5\n",
        );
        let point = shape_point_from_row(&row).unwrap();
        assert_eq!(point.sequence, 3);
        assert_eq!(point.dist_traveled, Some(120.5));
        assert_eq!(point.location, LatLon::new(52.48, -1.90));
    }
}
