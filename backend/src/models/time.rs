use chrono::{DateTime, Duration, Utc};
use serde::*;

/// Julian Date of the Unix epoch (1970-01-01 00:00:00 UTC).
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian Date of the J2000.0 epoch (2000-01-01 12:00:00 TT).
pub const J2000_JD: f64 = 2_451_545.0;

/// Offset between Julian Date and Modified Julian Date.
pub const MJD_OFFSET: f64 = 2_400_000.5;

/// Julian Date representation.
/// JD 0 = -4712-01-01 12:00:00 (proleptic Julian calendar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct JulianDate(qtty::Days);

impl JulianDate {
    /// Create a new JD value.
    pub fn new<V: Into<qtty::Days>>(v: V) -> Self {
        Self(v.into())
    }

    /// Raw JD value as f64.
    pub fn value(&self) -> f64 {
        self.0.value()
    }

    /// Modified Julian Date (JD − 2400000.5).
    pub fn mjd(&self) -> f64 {
        self.value() - MJD_OFFSET
    }

    /// Days elapsed since J2000.0.
    pub fn days_since_j2000(&self) -> f64 {
        self.value() - J2000_JD
    }

    /// Julian centuries elapsed since J2000.0.
    pub fn centuries_since_j2000(&self) -> f64 {
        self.days_since_j2000() / 36_525.0
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.value() - UNIX_EPOCH_JD) * 86_400.0
    }

    /// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn from_unix_timestamp(timestamp: f64) -> Self {
        Self::new(timestamp / 86_400.0 + UNIX_EPOCH_JD)
    }

    /// Convert to chrono DateTime<Utc>.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = self.to_unix_timestamp();
        let secs_i64 = secs.floor() as i64;
        let nanos = ((secs - secs.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs_i64, nanos).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Create from chrono DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_unix_timestamp(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9)
    }
}

impl From<f64> for JulianDate {
    fn from(v: f64) -> Self {
        JulianDate::new(v)
    }
}

impl From<DateTime<Utc>> for JulianDate {
    fn from(dt: DateTime<Utc>) -> Self {
        JulianDate::from_datetime(dt)
    }
}

/// Convert a fractional number of hours into a chrono duration (millisecond resolution).
pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Convert a chrono duration into fractional hours.
pub fn duration_to_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

/// Convert a chrono duration into fractional minutes.
pub fn duration_to_minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}
