#![allow(dead_code)]

use std::io::Write;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::NamedTempFile;

use nightplan::models::{ScheduleEntry, VisibilityPeriod};

pub const LA_PALMA_CONFIG: &str = r#"
[observer]
latitude = 28.7624
longitude = -17.8892

[visibility]
min_altitude = 30.0
min_visibility_hours = 2.0
sample_interval_minutes = 2

[imaging]
bortle = 4
fov_width = 1.2
fov_height = 0.8
mosaic_fov_width = 2.4
mosaic_fov_height = 1.6

[scheduling]
strategy = "max_objects"
max_overlap_minutes = 5.0
"#;

/// Winter catalog seen from La Palma: bright targets, a close pair for
/// mosaics, one object that never clears the altitude limit, and two
/// records with defects.
pub const WINTER_CATALOG: &str = r#"[
    {"name": "M42/Orion Nebula", "ra_hours": 5.588, "dec_degrees": -5.39, "fov": "85'x60'", "magnitude": 4.0},
    {"name": "M45/Pleiades", "ra_hours": 3.79, "dec_degrees": 24.1, "fov": "110'x110'", "magnitude": 1.6},
    {"name": "M1/Crab Nebula", "ra_hours": 5.575, "dec_degrees": 22.01, "fov": "6'x4'", "magnitude": 8.4},
    {"name": "M81", "ra_hours": 9.926, "dec_degrees": 69.07, "fov": "27'x14'", "magnitude": 6.9},
    {"name": "M82", "ra_hours": 9.931, "dec_degrees": 69.68, "fov": "11'x4'", "magnitude": 8.4},
    {"name": "Omega Centauri", "ra_hours": 13.446, "dec_degrees": -47.48, "fov": "36'x36'", "magnitude": 3.9},
    {"name": "Mystery", "ra_hours": 4.5, "dec_degrees": 30.0},
    {"name": "NGC 1499", "ra_hours": 4.01, "dec_degrees": 36.4, "fov": "huge", "magnitude": 6.0}
]"#;

pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

pub fn winter_night() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

pub fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, h, m, 0).unwrap()
}

/// True when `entry` lies inside one of `periods`.
pub fn within_periods(entry: &ScheduleEntry, periods: &[VisibilityPeriod]) -> bool {
    periods
        .iter()
        .any(|p| p.start <= entry.start && entry.end <= p.end)
}
