// ============================================================================
// Schedule model
// ============================================================================
//
// Strategy selection, scheduled entries and the bookkeeping of candidates that
// never made it to the scoring stage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::period::VisibilityPeriod;
use super::target::Target;
use super::time::duration_to_hours;
use crate::error::PlannerError;

/// Optimization goal used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStrategy {
    /// Prefer the targets that stay visible the longest
    LongestDuration,
    /// Fit as many targets as possible into the night
    #[default]
    MaxObjects,
    /// Prefer high, bright targets
    OptimalSnr,
    /// Prefer targets that need the fewest mosaic panels
    MinimalMosaic,
    /// Balance how feasible a target is against how hard it is
    DifficultyBalanced,
    /// Prefer mosaic groups over individual objects
    MosaicGroups,
}

impl SchedulingStrategy {
    pub const ALL: [SchedulingStrategy; 6] = [
        SchedulingStrategy::LongestDuration,
        SchedulingStrategy::MaxObjects,
        SchedulingStrategy::OptimalSnr,
        SchedulingStrategy::MinimalMosaic,
        SchedulingStrategy::DifficultyBalanced,
        SchedulingStrategy::MosaicGroups,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingStrategy::LongestDuration => "longest_duration",
            SchedulingStrategy::MaxObjects => "max_objects",
            SchedulingStrategy::OptimalSnr => "optimal_snr",
            SchedulingStrategy::MinimalMosaic => "minimal_mosaic",
            SchedulingStrategy::DifficultyBalanced => "difficulty_balanced",
            SchedulingStrategy::MosaicGroups => "mosaic_groups",
        }
    }
}

impl fmt::Display for SchedulingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulingStrategy {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        SchedulingStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| {
                PlannerError::InvalidConfig(format!(
                    "Unsupported scheduling strategy '{}'. Use one of: {}",
                    s,
                    SchedulingStrategy::ALL
                        .iter()
                        .map(|st| st.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// One observation slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub target: Target,
}

impl ScheduleEntry {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, target: Target) -> Self {
        Self { start, end, target }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn period(&self) -> VisibilityPeriod {
        VisibilityPeriod {
            start: self.start,
            end: self.end,
        }
    }

    /// Minutes shared with another entry (zero when disjoint).
    pub fn overlap_minutes(&self, other: &ScheduleEntry) -> f64 {
        self.period().overlap_minutes(&other.period())
    }
}

/// Why a candidate was removed before (or during) assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// No magnitude, so the required exposure is unknown
    MissingMagnitude,
    /// No visibility period reaches the minimum visibility duration
    NoQualifyingWindow,
    /// Visible time does not cover the required exposure
    InsufficientTime,
    /// Every feasible slot collided with an accepted entry
    NoFreeSlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedCandidate {
    pub name: String,
    pub reason: ExclusionReason,
}

/// Result of one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub strategy: SchedulingStrategy,
    /// Entries sorted by start time
    pub entries: Vec<ScheduleEntry>,
    #[serde(default)]
    pub excluded: Vec<ExcludedCandidate>,
}

impl Schedule {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self {
            strategy,
            entries: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of catalog objects covered (mosaic groups count every member).
    pub fn object_count(&self) -> usize {
        self.entries.iter().map(|e| e.target.object_count()).sum()
    }

    pub fn total_hours(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| duration_to_hours(e.duration()))
            .sum()
    }
}
