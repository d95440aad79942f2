//! Observation scheduler.
//!
//! Turns visibility and exposure data into a time-ordered list of observation
//! slots for one [`SchedulingStrategy`]. MaxObjects runs an
//! earliest-finish-time interval scheduler with a gap-closing pass; every
//! other strategy places candidates greedily in score order.
//!
//! Whatever the strategy, no two returned entries overlap by more than the
//! configured tolerance.

pub mod conflicts;
pub mod scoring;


use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::PlannerConfig;
use crate::models::{
    duration_to_hours, hours_to_duration, longest_period, total_duration, ExcludedCandidate,
    ExclusionReason, ExposureRequirement, ObjectId, Schedule, ScheduleEntry, SchedulingStrategy,
    Target, VisibilityPeriod,
};
use scoring::{score, ScoreInputs};

pub use conflicts::{find_conflicts, ConflictKind, ScheduleConflict};

/// Shortest slot the scheduler will create.
const MIN_SLOT_MINUTES: i64 = 1;

/// A target together with the data the scheduler needs about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleTarget {
    pub target: Target,
    /// Periods during which the target can be observed
    pub periods: Vec<VisibilityPeriod>,
    /// Degrees
    pub max_altitude: Option<f64>,
    /// `None` when the magnitude is unknown
    pub exposure: Option<ExposureRequirement>,
}

/// A target that passed the exclusion filters, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub target: Target,
    /// Periods at least as long as the minimum visibility, in time order
    pub periods: Vec<VisibilityPeriod>,
    /// Total time across `periods`
    pub duration: Duration,
    pub required: Duration,
    pub score: f64,
}

impl Candidate {
    /// Periods long enough to hold the whole required exposure.
    fn fitting_periods(&self) -> impl Iterator<Item = &VisibilityPeriod> {
        self.periods.iter().filter(move |p| p.duration() >= self.required)
    }
}

/// Trait for constraints a new slot must satisfy against accepted entries
pub trait SlotConstraint: Send + Sync {
    fn admits(&self, slot: &VisibilityPeriod, accepted: &[VisibilityPeriod]) -> bool;
}

/// No accepted slot may share more than `max_minutes` with the new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapTolerance {
    pub max_minutes: f64,
}

impl OverlapTolerance {
    pub fn strict() -> Self {
        Self { max_minutes: 0.0 }
    }
}

impl SlotConstraint for OverlapTolerance {
    fn admits(&self, slot: &VisibilityPeriod, accepted: &[VisibilityPeriod]) -> bool {
        accepted.iter().all(|a| {
            if self.max_minutes <= 0.0 {
                !a.overlaps(slot)
            } else {
                a.overlap_minutes(slot) <= self.max_minutes
            }
        })
    }
}

/// Scheduler tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerSettings {
    pub max_overlap_minutes: f64,
    pub exclude_insufficient_time: bool,
    pub slot_step: Duration,
    pub gap_threshold: Duration,
    pub min_visibility: Duration,
}

impl SchedulerSettings {
    pub fn from_config(config: &PlannerConfig) -> Self {
        let s = &config.scheduling;
        Self {
            max_overlap_minutes: s.max_overlap_minutes,
            exclude_insufficient_time: s.exclude_insufficient_time,
            slot_step: Duration::minutes(s.slot_step_minutes as i64),
            gap_threshold: Duration::milliseconds((s.gap_threshold_minutes * 60_000.0).round() as i64),
            min_visibility: config.min_visibility(),
        }
    }
}

/// A possible placement of one candidate (MaxObjects).
#[derive(Debug, Clone, Copy)]
struct Slot {
    candidate: usize,
    /// Visibility period the slot was cut from
    window: VisibilityPeriod,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    score: f64,
}

impl Slot {
    fn period(&self) -> VisibilityPeriod {
        VisibilityPeriod {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(SchedulerSettings::from_config(config))
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Targets a strategy works with.
    ///
    /// MosaicGroups uses every group plus the singles not covered by a group;
    /// all other strategies use singles only.
    pub fn targets_for_strategy<'a>(
        strategy: SchedulingStrategy,
        targets: &'a [ScheduleTarget],
    ) -> Vec<&'a ScheduleTarget> {
        match strategy {
            SchedulingStrategy::MosaicGroups => {
                let grouped: HashSet<ObjectId> = targets
                    .iter()
                    .filter(|t| t.target.is_group())
                    .flat_map(|t| t.target.member_ids())
                    .collect();
                targets
                    .iter()
                    .filter(|t| {
                        t.target.is_group()
                            || !t.target.member_ids().iter().any(|id| grouped.contains(id))
                    })
                    .collect()
            }
            _ => targets.iter().filter(|t| !t.target.is_group()).collect(),
        }
    }

    /// Filter and score targets.
    pub fn build_candidates(
        &self,
        strategy: SchedulingStrategy,
        targets: &[&ScheduleTarget],
    ) -> (Vec<Candidate>, Vec<ExcludedCandidate>) {
        let mut candidates = Vec::new();
        let mut excluded = Vec::new();

        for t in targets {
            let exclude = |reason| ExcludedCandidate {
                name: t.target.name().to_string(),
                reason,
            };

            let Some(exposure) = t.exposure else {
                excluded.push(exclude(ExclusionReason::MissingMagnitude));
                continue;
            };

            let periods = qualifying_periods(&t.periods, self.settings.min_visibility);
            if periods.is_empty() {
                excluded.push(exclude(ExclusionReason::NoQualifyingWindow));
                continue;
            }

            let duration = total_duration(&periods);
            let required = required_duration(exposure.total_hours);
            if self.settings.exclude_insufficient_time
                && !has_sufficient_time(&periods, self.settings.min_visibility, &exposure)
            {
                excluded.push(exclude(ExclusionReason::InsufficientTime));
                continue;
            }

            let inputs = ScoreInputs {
                duration_hours: duration_to_hours(duration),
                required_hours: exposure.total_hours,
                max_altitude: t.max_altitude,
                magnitude: t.target.magnitude(),
                panels: exposure.panels,
            };

            candidates.push(Candidate {
                score: score(strategy, &t.target, &inputs),
                target: t.target.clone(),
                periods,
                duration,
                required,
            });
        }

        (candidates, excluded)
    }

    /// Build the schedule for one strategy.
    pub fn schedule(&self, strategy: SchedulingStrategy, targets: &[ScheduleTarget]) -> Schedule {
        let pool = Self::targets_for_strategy(strategy, targets);
        let (candidates, mut excluded) = self.build_candidates(strategy, &pool);

        let (mut entries, unscheduled) = match strategy {
            SchedulingStrategy::MaxObjects => self.assign_max_objects(&candidates),
            _ => self.assign_greedy(&candidates),
        };

        excluded.extend(unscheduled.into_iter().map(|i| ExcludedCandidate {
            name: candidates[i].target.name().to_string(),
            reason: ExclusionReason::NoFreeSlot,
        }));

        entries.sort_by_key(|e| e.start);
        info!(
            "Strategy {}: {} entries from {} candidates ({} excluded)",
            strategy,
            entries.len(),
            candidates.len(),
            excluded.len()
        );

        Schedule {
            strategy,
            entries,
            excluded,
        }
    }

    /// Candidate slots of one candidate, every `slot_step` across each period
    /// that can hold the required exposure, plus the slot ending exactly at
    /// the period end.
    fn generate_slots(&self, index: usize, candidate: &Candidate) -> Vec<Slot> {
        let mut slots = Vec::new();
        let step = self.settings.slot_step.max(Duration::minutes(MIN_SLOT_MINUTES));

        for window in candidate.fitting_periods() {
            let last_start = window.end - candidate.required;
            let mut start = window.start;
            let mut pushed_last = false;
            while start <= last_start {
                slots.push(Slot {
                    candidate: index,
                    window: *window,
                    start,
                    end: start + candidate.required,
                    score: candidate.score,
                });
                pushed_last = start == last_start;
                start += step;
            }
            if !pushed_last {
                slots.push(Slot {
                    candidate: index,
                    window: *window,
                    start: last_start,
                    end: window.end,
                    score: candidate.score,
                });
            }
        }

        if slots.is_empty() && !self.settings.exclude_insufficient_time {
            if let Some(longest) = longest_period(&candidate.periods) {
                slots.push(Slot {
                    candidate: index,
                    window: *longest,
                    start: longest.start,
                    end: longest.end,
                    score: candidate.score,
                });
            }
        }

        slots
    }

    /// Earliest-finish interval scheduling, then gap closing and a final
    /// overlap check.
    fn assign_max_objects(&self, candidates: &[Candidate]) -> (Vec<ScheduleEntry>, Vec<usize>) {
        let mut slots: Vec<Slot> = candidates
            .iter()
            .enumerate()
            .flat_map(|(i, c)| self.generate_slots(i, c))
            .collect();
        slots.sort_by(|a, b| {
            a.end
                .cmp(&b.end)
                .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
        });
        debug!("MaxObjects: {} candidate slots", slots.len());

        let strict = OverlapTolerance::strict();
        let mut scheduled: HashSet<usize> = HashSet::new();
        let mut accepted: Vec<Slot> = Vec::new();
        let mut accepted_periods: Vec<VisibilityPeriod> = Vec::new();
        for slot in slots {
            if scheduled.contains(&slot.candidate) {
                continue;
            }
            if !strict.admits(&slot.period(), &accepted_periods) {
                continue;
            }
            scheduled.insert(slot.candidate);
            accepted_periods.push(slot.period());
            accepted.push(slot);
        }

        accepted.sort_by_key(|s| s.start);
        self.close_gaps(&mut accepted);

        let tolerance = OverlapTolerance {
            max_minutes: self.settings.max_overlap_minutes,
        };
        let mut kept: Vec<Slot> = Vec::with_capacity(accepted.len());
        let mut kept_periods: Vec<VisibilityPeriod> = Vec::with_capacity(accepted.len());
        for slot in accepted {
            if tolerance.admits(&slot.period(), &kept_periods) {
                kept_periods.push(slot.period());
                kept.push(slot);
            } else {
                debug!(
                    "Dropping {} after final overlap check",
                    candidates[slot.candidate].target.name()
                );
            }
        }

        let kept_ids: HashSet<usize> = kept.iter().map(|s| s.candidate).collect();
        let unscheduled = (0..candidates.len()).filter(|i| !kept_ids.contains(i)).collect();
        let entries = kept
            .into_iter()
            .map(|s| ScheduleEntry::new(s.start, s.end, candidates[s.candidate].target.clone()))
            .collect();

        (entries, unscheduled)
    }

    /// Pull slots earlier when the idle time before them exceeds the gap
    /// threshold. A slot never moves before the previous slot's end or out of
    /// its visibility period. `slots` must be sorted by start.
    fn close_gaps(&self, slots: &mut [Slot]) {
        for i in 1..slots.len() {
            let previous_end = slots[i - 1].end;
            let slot = slots[i];
            if slot.start - previous_end <= self.settings.gap_threshold {
                continue;
            }

            let new_start = previous_end.max(slot.window.start);
            if new_start >= slot.start {
                continue;
            }
            let shifted = Slot {
                start: new_start,
                end: new_start + (slot.end - slot.start),
                ..slot
            };

            let others: Vec<VisibilityPeriod> = slots
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, s)| s.period())
                .collect();
            if OverlapTolerance::strict().admits(&shifted.period(), &others) {
                slots[i] = shifted;
            }
        }
    }

    /// Score-ordered greedy placement at the start of the first period that
    /// fits and does not collide with accepted entries.
    fn assign_greedy(&self, candidates: &[Candidate]) -> (Vec<ScheduleEntry>, Vec<usize>) {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| {
            candidates[b]
                .score
                .partial_cmp(&candidates[a].score)
                .unwrap_or(Ordering::Equal)
        });

        let tolerance = OverlapTolerance {
            max_minutes: self.settings.max_overlap_minutes,
        };
        let mut entries = Vec::new();
        let mut accepted: Vec<VisibilityPeriod> = Vec::new();
        let mut unscheduled = Vec::new();

        for i in order {
            let candidate = &candidates[i];
            let mut options: Vec<VisibilityPeriod> = candidate
                .fitting_periods()
                .filter_map(|p| VisibilityPeriod::new(p.start, p.start + candidate.required))
                .collect();
            if options.is_empty() && !self.settings.exclude_insufficient_time {
                options.extend(longest_period(&candidate.periods).copied());
            }

            match options.into_iter().find(|slot| tolerance.admits(slot, &accepted)) {
                Some(slot) => {
                    accepted.push(slot);
                    entries.push(ScheduleEntry::new(slot.start, slot.end, candidate.target.clone()));
                }
                None => unscheduled.push(i),
            }
        }

        (entries, unscheduled)
    }
}

/// Slot length for an exposure of `hours`, never shorter than one minute.
pub fn required_duration(hours: f64) -> Duration {
    hours_to_duration(hours).max(Duration::minutes(MIN_SLOT_MINUTES))
}

/// Periods at least `min_visibility` long.
pub fn qualifying_periods(periods: &[VisibilityPeriod], min_visibility: Duration) -> Vec<VisibilityPeriod> {
    periods
        .iter()
        .filter(|p| p.duration() >= min_visibility)
        .copied()
        .collect()
}

/// Whether the qualifying periods together cover the required exposure.
/// Shorter periods never count towards it.
pub fn has_sufficient_time(
    periods: &[VisibilityPeriod],
    min_visibility: Duration,
    exposure: &ExposureRequirement,
) -> bool {
    total_duration(&qualifying_periods(periods, min_visibility)) >= required_duration(exposure.total_hours)
}
