//! Visibility window computation.
//!
//! An object is visible at an instant when it sits inside the configured
//! altitude/azimuth band while the Sun is below the darkness threshold.
//! Visibility is evaluated on a fixed time grid and consecutive visible
//! samples are merged into periods, so windows shorter than the sampling
//! interval can be missed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::astro::{calculate_altaz, sun_altitude, HorizontalCoords};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::models::{sample_periods, CelestialObject, Observer, VisibilityPeriod};

/// Degrees added on every side of the band when margins are enabled.
pub const VISIBILITY_MARGIN_DEG: f64 = 5.0;

/// Altitude/azimuth limits, in degrees.
///
/// `min_azimuth > max_azimuth` describes a band that wraps through north
/// (e.g. 300° → 60°).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityBand {
    pub min_altitude: f64,
    pub max_altitude: f64,
    pub min_azimuth: f64,
    pub max_azimuth: f64,
}

impl VisibilityBand {
    pub fn from_config(config: &PlannerConfig) -> Self {
        let v = &config.visibility;
        Self {
            min_altitude: v.min_altitude.value(),
            max_altitude: v.max_altitude.value(),
            min_azimuth: v.min_azimuth.value(),
            max_azimuth: v.max_azimuth.value(),
        }
    }

    /// Inclusive boundary test.
    pub fn contains(&self, altitude: f64, azimuth: f64, use_margins: bool) -> bool {
        let margin = if use_margins { VISIBILITY_MARGIN_DEG } else { 0.0 };

        let altitude_ok =
            altitude >= self.min_altitude - margin && altitude <= self.max_altitude + margin;

        altitude_ok && self.azimuth_in_band(azimuth, margin)
    }

    fn azimuth_in_band(&self, azimuth: f64, margin: f64) -> bool {
        let span = if self.min_azimuth <= self.max_azimuth {
            self.max_azimuth - self.min_azimuth
        } else {
            360.0 - self.min_azimuth + self.max_azimuth
        };
        let width = span + 2.0 * margin;
        if width >= 360.0 {
            return true;
        }

        let band_start = (self.min_azimuth - margin).rem_euclid(360.0);
        (azimuth - band_start).rem_euclid(360.0) <= width
    }
}

/// Convenience form of [`VisibilityBand::contains`].
pub fn is_visible(altitude: f64, azimuth: f64, band: &VisibilityBand, use_margins: bool) -> bool {
    band.contains(altitude, azimuth, use_margins)
}

/// What the sky looks like at one sampled instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkySample {
    pub object: HorizontalCoords,
    pub sun_altitude: f64,
}

/// Visibility periods of one target plus the best altitude reached in them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisibilityWindow {
    pub periods: Vec<VisibilityPeriod>,
    /// Degrees; `None` when the target is never visible
    pub max_altitude: Option<f64>,
}

/// Sample `sky` over `[start, end]` and collect the visible stretches.
///
/// # Arguments
/// * `band` - Altitude/azimuth band the target must fall in
/// * `dark_sun_altitude` - The Sun must be strictly below this altitude
/// * `step` - Sampling interval
/// * `sky` - Target and Sun positions at a given instant
///
/// # Returns
/// Disjoint periods in time order, and the maximum altitude seen while visible
pub fn find_windows_with<F>(
    band: &VisibilityBand,
    dark_sun_altitude: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    use_margins: bool,
    mut sky: F,
) -> VisibilityWindow
where
    F: FnMut(DateTime<Utc>) -> SkySample,
{
    let mut max_altitude: Option<f64> = None;

    let periods = sample_periods(start, end, step, |t| {
        let sample = sky(t);
        let visible = sample.sun_altitude < dark_sun_altitude
            && band.contains(sample.object.alt(), sample.object.az(), use_margins);
        if visible {
            let alt = sample.object.alt();
            max_altitude = Some(max_altitude.map_or(alt, |m| m.max(alt)));
        }
        visible
    });

    VisibilityWindow {
        periods,
        max_altitude,
    }
}

/// Finds visibility windows for catalog positions seen by one observer.
#[derive(Debug, Clone)]
pub struct VisibilityWindowFinder {
    observer: Observer,
    band: VisibilityBand,
    dark_sun_altitude: f64,
    sample_interval: Duration,
}

impl VisibilityWindowFinder {
    pub fn new(
        observer: Observer,
        band: VisibilityBand,
        dark_sun_altitude: f64,
        sample_interval: Duration,
    ) -> Self {
        Self {
            observer,
            band,
            dark_sun_altitude,
            sample_interval,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Ok(Self::new(
            config.observer()?,
            VisibilityBand::from_config(config),
            config.dark_sun_altitude(),
            config.sample_interval(),
        ))
    }

    pub fn band(&self) -> &VisibilityBand {
        &self.band
    }

    /// Visibility periods of `object` within `[start, end]`.
    pub fn find_visibility_window(
        &self,
        object: &CelestialObject,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        use_margins: bool,
    ) -> Vec<VisibilityPeriod> {
        self.find_window(object.ra, object.dec, start, end, use_margins)
            .periods
    }

    /// Visibility periods and peak altitude of a position (radians).
    pub fn find_window(
        &self,
        ra: f64,
        dec: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        use_margins: bool,
    ) -> VisibilityWindow {
        find_windows_with(
            &self.band,
            self.dark_sun_altitude,
            start,
            end,
            self.sample_interval,
            use_margins,
            |t| SkySample {
                object: calculate_altaz(&self.observer, ra, dec, t),
                sun_altitude: sun_altitude(&self.observer, t),
            },
        )
    }
}
