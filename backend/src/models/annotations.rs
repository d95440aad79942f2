//! Per-object results produced by the pipeline stages.
//!
//! Catalog objects are never mutated. Each stage returns plain records that the
//! planner collects into a map keyed by [`ObjectId`](super::ObjectId).

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::period::VisibilityPeriod;
use super::time::{duration_to_hours, hours_to_duration};

/// Imaging time needed to reach a usable signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureRequirement {
    /// Total integration time across all panels, in hours
    pub total_hours: f64,
    /// Number of single exposures
    pub frame_count: u32,
    /// Number of instrument-sized tiles
    pub panels: u32,
}

impl ExposureRequirement {
    pub fn duration(&self) -> Duration {
        hours_to_duration(self.total_hours)
    }
}

/// Moon interference found for one object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoonInterference {
    pub periods: Vec<VisibilityPeriod>,
    pub total_minutes: f64,
    /// True only when the interference lasts at least the configured minimum
    pub near_moon: bool,
}

/// Everything the planner knows about one catalog object for the night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAnnotations {
    pub visibility_periods: Vec<VisibilityPeriod>,
    pub visible_hours: f64,
    /// Highest altitude (degrees) reached while visible; `None` if never visible
    pub max_altitude: Option<f64>,
    /// `None` when the object has no magnitude
    pub required_exposure: Option<ExposureRequirement>,
    /// `None` when the exposure is unknown
    pub sufficient_time: Option<bool>,
    pub moon: MoonInterference,
}

impl ObjectAnnotations {
    pub fn visible_duration(&self) -> Duration {
        hours_to_duration(self.visible_hours)
    }

    /// Longest single visibility period, in hours.
    pub fn longest_period_hours(&self) -> f64 {
        self.visibility_periods
            .iter()
            .map(|p| duration_to_hours(p.duration()))
            .fold(0.0, f64::max)
    }
}
