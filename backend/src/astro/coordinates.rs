//! Time and coordinate conversions.
//!
//! Julian Date, Local Sidereal Time and the equatorial → horizontal transform
//! for a fixed observer. All functions are pure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::models::{JulianDate, Observer};

/// Equatorial coordinates in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoords {
    pub ra: f64,
    pub dec: f64,
}

/// Horizontal coordinates in degrees.
///
/// Altitude is in `[-90, 90]`, azimuth in `[0, 360)` measured from north
/// through east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalCoords {
    pub altitude: qtty::Degrees,
    pub azimuth: qtty::Degrees,
}

impl HorizontalCoords {
    pub fn alt(&self) -> f64 {
        self.altitude.value()
    }

    pub fn az(&self) -> f64 {
        self.azimuth.value()
    }
}

/// Clamp an argument of `asin`/`acos` into `[-1, 1]`.
#[inline]
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Julian Date of a UTC instant.
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    JulianDate::from_datetime(t).value()
}

/// Greenwich mean sidereal time in radians, `[0, 2π)`.
pub fn greenwich_sidereal_time(jd: f64) -> f64 {
    let d = jd - crate::models::J2000_JD;
    let t = d / 36_525.0;
    let gmst_deg = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    gmst_deg.rem_euclid(360.0).to_radians()
}

/// Local sidereal time in radians, `[0, 2π)`.
pub fn local_sidereal_time(observer: &Observer, t: DateTime<Utc>) -> f64 {
    (greenwich_sidereal_time(julian_date(t)) + observer.longitude).rem_euclid(TAU)
}

/// Convert equatorial coordinates (radians) to altitude/azimuth for `observer` at `t`.
pub fn equatorial_to_horizontal(
    observer: &Observer,
    coords: EquatorialCoords,
    t: DateTime<Utc>,
) -> HorizontalCoords {
    let lst = local_sidereal_time(observer, t);
    hour_angle_to_horizontal(observer.latitude, lst - coords.ra, coords.dec)
}

/// Horizontal coordinates from hour angle and declination (radians).
pub fn hour_angle_to_horizontal(latitude: f64, hour_angle: f64, dec: f64) -> HorizontalCoords {
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();

    let sin_alt = sin_dec * sin_lat + cos_dec * cos_lat * hour_angle.cos();
    let alt = clamp_unit(sin_alt).asin();

    let denom = alt.cos() * cos_lat;
    let az = if denom.abs() < 1e-12 {
        // Zenith or geographic pole: azimuth undefined
        0.0
    } else {
        let cos_az = (sin_dec - alt.sin() * sin_lat) / denom;
        let a = clamp_unit(cos_az).acos();
        if hour_angle.sin() > 0.0 {
            TAU - a
        } else {
            a
        }
    };

    HorizontalCoords {
        altitude: qtty::Degrees::new(alt.to_degrees()),
        azimuth: qtty::Degrees::new(az.to_degrees().rem_euclid(360.0)),
    }
}

/// Altitude/azimuth of a catalog position (radians) at `t`.
pub fn calculate_altaz(observer: &Observer, ra: f64, dec: f64, t: DateTime<Utc>) -> HorizontalCoords {
    equatorial_to_horizontal(observer, EquatorialCoords { ra, dec }, t)
}

/// Returns the separation, in radians, between the given celestial coordinates
/// (in radians).
pub fn angular_separation(p0_ra: f64, p0_dec: f64, p1_ra: f64, p1_dec: f64) -> f64 {
    clamp_unit(
        p0_dec.sin() * p1_dec.sin() + p0_dec.cos() * p1_dec.cos() * (p0_ra - p1_ra).cos(),
    )
    .acos()
}

/// Ecliptic (longitude, latitude) in radians → equatorial, for obliquity `eps` (radians).
pub fn ecliptic_to_equatorial(lambda: f64, beta: f64, eps: f64) -> EquatorialCoords {
    let (sin_l, cos_l) = lambda.sin_cos();
    let (sin_e, cos_e) = eps.sin_cos();
    let ra = (sin_l * cos_e - beta.tan() * sin_e).atan2(cos_l);
    let dec = clamp_unit(beta.sin() * cos_e + beta.cos() * sin_e * sin_l).asin();
    EquatorialCoords {
        ra: ra.rem_euclid(TAU),
        dec,
    }
}

/// Mean obliquity of the ecliptic in degrees for `t` Julian centuries since J2000.
pub fn mean_obliquity_deg(t: f64) -> f64 {
    23.439_291_1 - 0.013_004_2 * t - 1.64e-7 * t * t + 5.04e-7 * t * t * t
}
