//! Lunar position and phase.
//!
//! Truncated periodic series for the geocentric ecliptic longitude, latitude
//! and distance of the Moon. The term tables are ordered by amplitude, so a
//! shorter prefix trades accuracy for speed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinates::{
    clamp_unit, ecliptic_to_equatorial, equatorial_to_horizontal, mean_obliquity_deg,
    EquatorialCoords, HorizontalCoords,
};
use super::sun::sun_ecliptic;
use crate::models::{JulianDate, Observer};

/// Equatorial radius of the Earth in kilometres.
const EARTH_RADIUS_KM: f64 = 6_378.14;

/// Series truncation used for lunar positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPrecision {
    /// Leading 14 longitude and 10 latitude terms (about 10 arcmin)
    #[default]
    Standard,
    /// Full tables, additive planetary terms and topocentric parallax (about 1 arcmin)
    High,
}

impl MoonPrecision {
    fn longitude_terms(self) -> usize {
        match self {
            MoonPrecision::Standard => 14,
            MoonPrecision::High => LONGITUDE_TERMS.len(),
        }
    }

    fn latitude_terms(self) -> usize {
        match self {
            MoonPrecision::Standard => 10,
            MoonPrecision::High => LATITUDE_TERMS.len(),
        }
    }
}

/// `(D, M, M', F, Σl [1e-6 deg], Σr [1e-3 km])`
const LONGITUDE_TERMS: [(i8, i8, i8, i8, f64, f64); 32] = [
    (0, 0, 1, 0, 6_288_774.0, -20_905_355.0),
    (2, 0, -1, 0, 1_274_027.0, -3_699_111.0),
    (2, 0, 0, 0, 658_314.0, -2_955_968.0),
    (0, 0, 2, 0, 213_618.0, -569_925.0),
    (0, 1, 0, 0, -185_116.0, 48_888.0),
    (0, 0, 0, 2, -114_332.0, -3_149.0),
    (2, 0, -2, 0, 58_793.0, 246_158.0),
    (2, -1, -1, 0, 57_066.0, -152_138.0),
    (2, 0, 1, 0, 53_322.0, -170_733.0),
    (2, -1, 0, 0, 45_758.0, -204_586.0),
    (0, 1, -1, 0, -40_923.0, -129_620.0),
    (1, 0, 0, 0, -34_720.0, 108_743.0),
    (0, 1, 1, 0, -30_383.0, 104_755.0),
    (2, 0, 0, -2, 15_327.0, 10_321.0),
    (0, 0, 1, 2, -12_528.0, 0.0),
    (0, 0, 1, -2, 10_980.0, 79_661.0),
    (4, 0, -1, 0, 10_675.0, -34_782.0),
    (0, 0, 3, 0, 10_034.0, -23_210.0),
    (4, 0, -2, 0, 8_548.0, -21_636.0),
    (2, 1, -1, 0, -7_888.0, 24_208.0),
    (2, 1, 0, 0, -6_766.0, 30_824.0),
    (1, 0, -1, 0, -5_163.0, -8_379.0),
    (1, 1, 0, 0, 4_987.0, -16_675.0),
    (2, -1, 1, 0, 4_036.0, -12_831.0),
    (2, 0, 2, 0, 3_994.0, -10_445.0),
    (4, 0, 0, 0, 3_861.0, -11_650.0),
    (2, 0, -3, 0, 3_665.0, 14_403.0),
    (0, 1, -2, 0, -2_689.0, -7_003.0),
    (2, 0, -1, 2, -2_602.0, 0.0),
    (2, -1, -2, 0, 2_390.0, 10_056.0),
    (1, 0, 1, 0, -2_348.0, 6_322.0),
    (2, -2, 0, 0, 2_236.0, -9_884.0),
];

/// `(D, M, M', F, Σb [1e-6 deg])`
const LATITUDE_TERMS: [(i8, i8, i8, i8, f64); 30] = [
    (0, 0, 0, 1, 5_128_122.0),
    (0, 0, 1, 1, 280_602.0),
    (0, 0, 1, -1, 277_693.0),
    (2, 0, 0, -1, 173_237.0),
    (2, 0, -1, 1, 55_413.0),
    (2, 0, -1, -1, 46_271.0),
    (2, 0, 0, 1, 32_573.0),
    (0, 0, 2, 1, 17_198.0),
    (2, 0, 1, -1, 9_266.0),
    (0, 0, 2, -1, 8_822.0),
    (2, -1, 0, -1, 8_216.0),
    (2, 0, -2, -1, 4_324.0),
    (2, 0, 1, 1, 4_200.0),
    (2, 1, 0, -1, -3_359.0),
    (2, -1, -1, 1, 2_463.0),
    (2, -1, 0, 1, 2_211.0),
    (2, -1, -1, -1, 2_065.0),
    (0, 1, -1, -1, -1_870.0),
    (4, 0, -1, -1, 1_828.0),
    (0, 1, 0, 1, -1_794.0),
    (0, 0, 0, 3, -1_749.0),
    (0, 1, -1, 1, -1_565.0),
    (1, 0, 0, 1, -1_491.0),
    (0, 1, 1, 1, -1_475.0),
    (0, 1, 1, -1, -1_410.0),
    (0, 1, 0, -1, -1_344.0),
    (1, 0, 0, -1, -1_335.0),
    (0, 0, 3, 1, 1_107.0),
    (4, 0, 0, -1, 1_021.0),
    (4, 0, -1, 1, 833.0),
];

/// Geocentric ecliptic position of the Moon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarEcliptic {
    /// Ecliptic longitude in degrees, `[0, 360)`
    pub longitude: f64,
    /// Ecliptic latitude in degrees
    pub latitude: f64,
    /// Earth–Moon distance in kilometres
    pub distance_km: f64,
}

/// Fundamental arguments in degrees: `(L', D, M, M', F)`.
fn fundamental_arguments(t: f64) -> (f64, f64, f64, f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let l_prime =
        218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2 + t3 / 538_841.0 - t4 / 65_194_000.0;
    let d = 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let m = 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0;
    let m_prime = 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;
    let f = 93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0;

    (
        l_prime.rem_euclid(360.0),
        d.rem_euclid(360.0),
        m.rem_euclid(360.0),
        m_prime.rem_euclid(360.0),
        f.rem_euclid(360.0),
    )
}

/// Geocentric ecliptic longitude, latitude and distance of the Moon for a Julian Date.
pub fn moon_ecliptic(jd: f64, precision: MoonPrecision) -> LunarEcliptic {
    let t = JulianDate::new(jd).centuries_since_j2000();
    let (l_prime, d, m, m_prime, f) = fundamental_arguments(t);

    // Terms involving the Sun's mean anomaly shrink with the Earth's orbital eccentricity
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;
    let eccentricity_factor = |m_mult: i8| match m_mult.abs() {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let (d_r, m_r, mp_r, f_r) = (
        d.to_radians(),
        m.to_radians(),
        m_prime.to_radians(),
        f.to_radians(),
    );
    let argument = |cd: i8, cm: i8, cmp: i8, cf: i8| {
        cd as f64 * d_r + cm as f64 * m_r + cmp as f64 * mp_r + cf as f64 * f_r
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(cd, cm, cmp, cf, sl, sr) in &LONGITUDE_TERMS[..precision.longitude_terms()] {
        let arg = argument(cd, cm, cmp, cf);
        let ef = eccentricity_factor(cm);
        sum_l += sl * ef * arg.sin();
        sum_r += sr * ef * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(cd, cm, cmp, cf, sb) in &LATITUDE_TERMS[..precision.latitude_terms()] {
        sum_b += sb * eccentricity_factor(cm) * argument(cd, cm, cmp, cf).sin();
    }

    if precision == MoonPrecision::High {
        let a1 = (119.75 + 131.849 * t).to_radians();
        let a2 = (53.09 + 479_264.290 * t).to_radians();
        let a3 = (313.45 + 481_266.484 * t).to_radians();
        let lp_r = l_prime.to_radians();

        sum_l += 3_958.0 * a1.sin() + 1_962.0 * (lp_r - f_r).sin() + 318.0 * a2.sin();
        sum_b += -2_235.0 * lp_r.sin()
            + 382.0 * a3.sin()
            + 175.0 * (a1 - f_r).sin()
            + 175.0 * (a1 + f_r).sin()
            + 127.0 * (lp_r - mp_r).sin()
            - 115.0 * (lp_r + mp_r).sin();
    }

    LunarEcliptic {
        longitude: (l_prime + sum_l / 1_000_000.0).rem_euclid(360.0),
        latitude: sum_b / 1_000_000.0,
        distance_km: 385_000.56 + sum_r / 1_000.0,
    }
}

/// Geocentric right ascension and declination of the Moon (radians).
pub fn moon_equatorial(t: DateTime<Utc>, precision: MoonPrecision) -> EquatorialCoords {
    let jd = JulianDate::from_datetime(t);
    let ecl = moon_ecliptic(jd.value(), precision);
    let eps = mean_obliquity_deg(jd.centuries_since_j2000()).to_radians();
    ecliptic_to_equatorial(ecl.longitude.to_radians(), ecl.latitude.to_radians(), eps)
}

/// Altitude and azimuth of the Moon as seen by `observer` at `t`.
///
/// High precision applies the topocentric parallax in altitude, which can
/// reach a full degree near the horizon.
pub fn moon_position(observer: &Observer, t: DateTime<Utc>, precision: MoonPrecision) -> HorizontalCoords {
    let coords = moon_equatorial(t, precision);
    let mut hz = equatorial_to_horizontal(observer, coords, t);

    if precision == MoonPrecision::High {
        let jd = JulianDate::from_datetime(t).value();
        let distance = moon_ecliptic(jd, precision).distance_km;
        let sin_hp = EARTH_RADIUS_KM / distance;
        let alt = hz.alt().to_radians();
        let parallax = clamp_unit(sin_hp * alt.cos()).asin();
        hz.altitude = qtty::Degrees::new((alt - parallax).to_degrees());
    }

    hz
}

/// Illuminated fraction and waxing state of the Moon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPhase {
    /// Illuminated fraction of the disk, `[0, 1]` (0 new, 1 full)
    pub illumination: f64,
    /// True between new and full moon
    pub waxing: bool,
}

impl MoonPhase {
    pub fn tier(&self) -> MoonPhaseTier {
        MoonPhaseTier::from_illumination(self.illumination)
    }
}

/// Coarse phase classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhaseTier {
    New,
    Crescent,
    Quarter,
    Gibbous,
    Full,
}

impl MoonPhaseTier {
    pub fn from_illumination(fraction: f64) -> Self {
        match fraction {
            f if f < 0.1 => MoonPhaseTier::New,
            f if f < 0.4 => MoonPhaseTier::Crescent,
            f if f < 0.6 => MoonPhaseTier::Quarter,
            f if f < 0.9 => MoonPhaseTier::Gibbous,
            _ => MoonPhaseTier::Full,
        }
    }
}

/// Phase of the Moon at `t`.
pub fn moon_phase_details(t: DateTime<Utc>) -> MoonPhase {
    let jd = JulianDate::from_datetime(t).value();
    let sun = sun_ecliptic(jd);
    let moon = moon_ecliptic(jd, MoonPrecision::High);

    let beta = moon.latitude.to_radians();
    let delta_lambda = (moon.longitude - sun.longitude).to_radians();

    let cos_elongation = clamp_unit(beta.cos() * delta_lambda.cos());
    let elongation = cos_elongation.acos();
    let phase_angle = (sun.distance_km * elongation.sin())
        .atan2(moon.distance_km - sun.distance_km * cos_elongation);

    MoonPhase {
        illumination: ((1.0 + phase_angle.cos()) / 2.0).clamp(0.0, 1.0),
        waxing: (moon.longitude - sun.longitude).rem_euclid(360.0) < 180.0,
    }
}

/// Illuminated fraction of the Moon at `t`, `[0, 1]`.
pub fn moon_phase(t: DateTime<Utc>) -> f64 {
    moon_phase_details(t).illumination
}
