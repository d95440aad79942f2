//! Low-precision solar position.
//!
//! Mean longitude, mean anomaly and the equation of centre give the true
//! longitude; a nutation/aberration term turns it into the apparent longitude.
//! Accuracy is about 0.01° over the 20th and 21st centuries, well inside what
//! twilight and darkness tests need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinates::{
    ecliptic_to_equatorial, equatorial_to_horizontal, mean_obliquity_deg, EquatorialCoords,
    HorizontalCoords,
};
use crate::models::{JulianDate, Observer};

/// Kilometres per astronomical unit.
pub const AU_KM: f64 = 149_597_870.7;

/// Geocentric apparent position of the Sun in ecliptic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarEcliptic {
    /// Apparent ecliptic longitude in degrees, `[0, 360)`
    pub longitude: f64,
    /// Earth–Sun distance in kilometres
    pub distance_km: f64,
    /// True obliquity of the ecliptic in degrees
    pub obliquity: f64,
}

/// Solar ecliptic position for a Julian Date.
pub fn sun_ecliptic(jd: f64) -> SolarEcliptic {
    let t = JulianDate::new(jd).centuries_since_j2000();

    let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t;
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t).to_radians();
    let e = 0.016_708_634 - 0.000_042_037 * t - 0.000_000_126_7 * t * t;

    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();

    let true_longitude = l0 + c;
    let true_anomaly = m + c.to_radians();
    let radius_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

    let omega = (125.04 - 1_934.136 * t).to_radians();
    let apparent = true_longitude - 0.005_69 - 0.004_78 * omega.sin();

    SolarEcliptic {
        longitude: apparent.rem_euclid(360.0),
        distance_km: radius_au * AU_KM,
        obliquity: mean_obliquity_deg(t) + 0.002_56 * omega.cos(),
    }
}

/// Apparent right ascension and declination of the Sun (radians).
pub fn sun_equatorial(t: DateTime<Utc>) -> EquatorialCoords {
    let ecl = sun_ecliptic(JulianDate::from_datetime(t).value());
    ecliptic_to_equatorial(ecl.longitude.to_radians(), 0.0, ecl.obliquity.to_radians())
}

/// Altitude and azimuth of the Sun as seen by `observer` at `t`.
pub fn sun_position(observer: &Observer, t: DateTime<Utc>) -> HorizontalCoords {
    equatorial_to_horizontal(observer, sun_equatorial(t), t)
}

/// Sun altitude in degrees.
pub fn sun_altitude(observer: &Observer, t: DateTime<Utc>) -> f64 {
    sun_position(observer, t).alt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    /// Signed difference `a - b` folded into `(-180, 180]`.
    fn angle_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        if d > 180.0 {
            d - 360.0
        } else {
            d
        }
    }

    #[test]
    fn test_june_solstice_2024() {
        let t = Utc.with_ymd_and_hms(2024, 6, 20, 20, 51, 0).unwrap();
        let ecl = sun_ecliptic(JulianDate::from_datetime(t).value());
        assert_abs_diff_eq!(angle_diff(ecl.longitude, 90.0), 0.0, epsilon = 0.05);

        let eq = sun_equatorial(t);
        assert_abs_diff_eq!(eq.dec.to_degrees(), 23.44, epsilon = 0.05);
    }

    #[test]
    fn test_march_equinox_2024() {
        let t = Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 0).unwrap();
        let ecl = sun_ecliptic(JulianDate::from_datetime(t).value());
        assert_abs_diff_eq!(angle_diff(ecl.longitude, 0.0), 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(sun_equatorial(t).dec.to_degrees(), 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_meeus_example_25a() {
        // 1992 October 13, 0h TD: apparent longitude 199.90988°
        let ecl = sun_ecliptic(2_448_908.5);
        assert_abs_diff_eq!(ecl.longitude, 199.909_88, epsilon = 0.01);
        assert_abs_diff_eq!(ecl.distance_km / AU_KM, 0.997_66, epsilon = 1e-4);
    }

    #[test]
    fn test_sun_high_at_local_noon_in_summer() {
        // Greenwich, June solstice, 12:00 UTC: altitude ≈ 90 - 51.48 + 23.44
        let obs = Observer::from_degrees(51.48, 0.0).unwrap();
        let t = Utc.with_ymd_and_hms(2024, 6, 20, 12, 2, 0).unwrap();
        let hz = sun_position(&obs, t);
        assert_abs_diff_eq!(hz.alt(), 61.96, epsilon = 0.3);
        assert_abs_diff_eq!(hz.az(), 180.0, epsilon = 2.0);
    }

    #[test]
    fn test_sun_below_horizon_at_midnight() {
        let obs = Observer::from_degrees(40.0, -3.7).unwrap();
        let t = Utc.with_ymd_and_hms(2024, 12, 21, 0, 0, 0).unwrap();
        assert!(sun_altitude(&obs, t) < -50.0);
    }
}
