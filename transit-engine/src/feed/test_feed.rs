//! Throwaway feed directories for tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// A GTFS directory on disk.
pub struct TestFeed {
    dir: TempDir,
}

impl TestFeed {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn with_table(self, name: &'static str, contents: &str) -> Self {
        fs::write(self.dir.path().join(name), contents).unwrap();
        self
    }

    pub fn without_table(self, name: &'static str) -> Self {
        let _ = fs::remove_file(self.dir.path().join(name));
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// One bus route with one Monday-to-Friday trip from A (08:00) to B (08:15).
pub fn minimal_feed() -> TestFeed {
    TestFeed::new()
        .with_table(
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_type\n\
             R1,NX,11A,Outer Circle,3\n",
        )
        .with_table(
            "trips.txt",
            "route_id,service_id,trip_id,trip_headsign,shape_id\n\
             R1,S1,T1,City Centre,SH1\n",
        )
        .with_table(
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\n\
             A,Alpha,52.48,-1.90\n\
             B,Bravo,52.50,-1.89\n",
        )
        .with_table(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,08:00:00,08:00:00,A,1\n\
             T1,08:15:00,08:15:00,B,2\n",
        )
        .with_table(
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             S1,1,1,1,1,1,0,0,20200101,20991231\n",
        )
        .with_table("calendar_dates.txt", "service_id,date,exception_type\n")
        .with_table(
            "shapes.txt",
            "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
             SH1,52.48,-1.90,1\n\
             SH1,52.49,-1.895,2\n\
             SH1,52.50,-1.89,3\n",
        )
}
