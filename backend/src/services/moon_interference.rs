//! Moon interference analysis.
//!
//! During every visibility sample with the Moon above the horizon, the
//! object–Moon separation is compared with an interference radius that grows
//! with the Moon's illumination, the faintness of the object and the
//! brightness of the sky.

use chrono::{DateTime, Duration, Utc};

use crate::astro::coordinates::angular_separation;
use crate::astro::moon::{moon_equatorial, moon_position, MoonPhaseTier, MoonPrecision};
use crate::astro::EquatorialCoords;
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::models::{
    duration_to_minutes, sample_periods, total_duration, MoonInterference, Observer,
    VisibilityPeriod,
};

pub const MIN_INTERFERENCE_RADIUS_DEG: f64 = 15.0;
pub const MAX_INTERFERENCE_RADIUS_DEG: f64 = 90.0;

/// Base radius (degrees) for each phase tier.
pub fn base_radius(tier: MoonPhaseTier) -> f64 {
    match tier {
        MoonPhaseTier::New => 20.0,
        MoonPhaseTier::Crescent => 30.0,
        MoonPhaseTier::Quarter => 40.0,
        MoonPhaseTier::Gibbous => 30.0,
        MoonPhaseTier::Full => 60.0,
    }
}

/// 1 for objects of magnitude 6 or brighter, rising linearly to 2 at
/// magnitude 14 and beyond. Unknown magnitude counts as bright.
pub fn magnitude_factor(magnitude: Option<f64>) -> f64 {
    match magnitude {
        Some(m) => 1.0 + ((m - 6.0) / 8.0).clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// Interference radius in degrees, clamped to `[15, 90]`.
pub fn interference_radius(phase: f64, magnitude: Option<f64>, bortle: u8) -> f64 {
    let sky_factor = (bortle as f64 / 5.0).powf(1.5);
    let radius = base_radius(MoonPhaseTier::from_illumination(phase))
        * magnitude_factor(magnitude)
        * sky_factor;
    radius.clamp(MIN_INTERFERENCE_RADIUS_DEG, MAX_INTERFERENCE_RADIUS_DEG)
}

#[derive(Debug, Clone)]
pub struct MoonInterferenceAnalyzer {
    observer: Observer,
    precision: MoonPrecision,
    bortle: u8,
    sample_interval: Duration,
    min_interference: Duration,
}

impl MoonInterferenceAnalyzer {
    pub fn new(
        observer: Observer,
        precision: MoonPrecision,
        bortle: u8,
        sample_interval: Duration,
        min_interference: Duration,
    ) -> Self {
        Self {
            observer,
            precision,
            bortle,
            sample_interval,
            min_interference,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Ok(Self::new(
            config.observer()?,
            config.moon.precision,
            config.imaging.bortle,
            config.sample_interval(),
            Duration::milliseconds((config.moon.min_interference_minutes * 60_000.0).round() as i64),
        ))
    }

    /// Whether the Moon interferes with a position (radians) at `t`.
    pub fn interferes_at(&self, ra: f64, dec: f64, radius_deg: f64, t: DateTime<Utc>) -> bool {
        if moon_position(&self.observer, t, self.precision).alt() <= 0.0 {
            return false;
        }
        let moon = moon_equatorial(t, self.precision);
        angular_separation(ra, dec, moon.ra, moon.dec).to_degrees() < radius_deg
    }

    /// Interference periods of a target over its visibility periods.
    ///
    /// # Arguments
    /// * `target` - Target position in radians
    /// * `magnitude` - Target magnitude, if known
    /// * `visibility` - Periods during which the target is observable
    /// * `phase` - Moon illuminated fraction for the night
    pub fn analyze(
        &self,
        target: EquatorialCoords,
        magnitude: Option<f64>,
        visibility: &[VisibilityPeriod],
        phase: f64,
    ) -> MoonInterference {
        let radius = interference_radius(phase, magnitude, self.bortle);

        let periods: Vec<VisibilityPeriod> = visibility
            .iter()
            .flat_map(|p| {
                sample_periods(p.start, p.end, self.sample_interval, |t| {
                    self.interferes_at(target.ra, target.dec, radius, t)
                })
            })
            .collect();

        let total = total_duration(&periods);
        MoonInterference {
            total_minutes: duration_to_minutes(total),
            near_moon: !periods.is_empty() && total >= self.min_interference,
            periods,
        }
    }
}
