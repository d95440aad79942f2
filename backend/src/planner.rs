//! End-to-end night planning.
//!
//! [`NightPlanner`] wires the pipeline stages in order: night bounds, per-object
//! visibility, Moon interference and exposure, mosaic grouping, and one
//! schedule per requested strategy. The per-object stages run in parallel.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::astro::{moon_phase_details, EquatorialCoords, MoonPhase, MoonPhaseTier};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::models::{
    duration_to_hours, total_duration, CelestialObject, ExclusionReason, MosaicGroup,
    ObjectAnnotations, ObjectId, Observer, Schedule, SchedulingStrategy, Target,
    VisibilityPeriod,
};
use crate::scheduler::{has_sufficient_time, ScheduleTarget, Scheduler};
use crate::services::{
    ExposurePlanner, MoonInterferenceAnalyzer, MosaicGrouper, TwilightFinder,
    VisibilityWindowFinder,
};

/// Why an object was rejected from the plan as a whole.
pub type RejectionReason = ExclusionReason;

/// What to plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Calendar date on which the night starts
    pub date: NaiveDate,
    /// Reference time; scanning starts here when it falls inside the night
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    /// Strategies to schedule; empty means the configured one
    #[serde(default)]
    pub strategies: Vec<SchedulingStrategy>,
}

impl PlanRequest {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            now: None,
            strategies: Vec::new(),
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = SchedulingStrategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedObject {
    pub id: ObjectId,
    pub name: String,
    pub reason: RejectionReason,
}

/// Everything the planner produced for one night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightPlan {
    pub date: NaiveDate,
    /// Sunset to sunrise; `None` when the Sun does not set or rise
    pub night: Option<VisibilityPeriod>,
    /// Astronomical dusk to dawn; `None` without full darkness
    pub astronomical_twilight: Option<VisibilityPeriod>,
    /// Time range that was actually scanned
    pub scan_window: Option<VisibilityPeriod>,
    /// Moon phase at local midnight
    pub moon_phase: MoonPhase,
    pub moon_phase_tier: MoonPhaseTier,
    pub annotations: BTreeMap<ObjectId, ObjectAnnotations>,
    /// Visible, with enough time for the required exposure
    pub visible_sufficient: Vec<ObjectId>,
    /// Visible, but not long enough for the required exposure
    pub visible_insufficient: Vec<ObjectId>,
    pub rejected: Vec<RejectedObject>,
    pub warnings: Vec<String>,
    pub groups: Vec<MosaicGroup>,
    pub schedules: Vec<Schedule>,
}

impl NightPlan {
    pub fn schedule(&self, strategy: SchedulingStrategy) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.strategy == strategy)
    }

    /// True when no object reached a qualifying visibility window.
    pub fn nothing_visible(&self) -> bool {
        self.visible_sufficient.is_empty() && self.visible_insufficient.is_empty()
    }
}

/// Per-object result of the parallel stage.
struct ObjectReport {
    annotations: ObjectAnnotations,
    warning: Option<String>,
}

/// Runs the whole pipeline for a catalog.
#[derive(Debug, Clone)]
pub struct NightPlanner {
    config: PlannerConfig,
    observer: Observer,
    twilight: TwilightFinder,
    visibility: VisibilityWindowFinder,
    moon: MoonInterferenceAnalyzer,
    exposure: ExposurePlanner,
    mosaic: MosaicGrouper,
    scheduler: Scheduler,
}

impl NightPlanner {
    /// Validate `config` and build every stage from it.
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            observer: config.observer()?,
            twilight: TwilightFinder::from_config(&config)?,
            visibility: VisibilityWindowFinder::from_config(&config)?,
            moon: MoonInterferenceAnalyzer::from_config(&config)?,
            exposure: ExposurePlanner::from_config(&config),
            mosaic: MosaicGrouper::from_config(&config),
            scheduler: Scheduler::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Plan one night for `catalog`.
    pub fn plan(&self, catalog: &[CelestialObject], request: &PlanRequest) -> NightPlan {
        let mut warnings = Vec::new();

        let night = self.twilight.find_sunset_sunrise(request.date);
        let astronomical_twilight = self.twilight.find_astronomical_twilight(request.date);

        let noon = self
            .twilight
            .solar_noon(request.date)
            .unwrap_or_else(|| request.date.and_time(NaiveTime::MIN).and_utc());
        let midnight = noon + Duration::hours(12);

        let full_window = match night {
            Some(n) => Some(n),
            None => {
                let message = format!(
                    "The Sun does not both set and rise around {}; scanning a full day for darkness",
                    request.date
                );
                warn!("{}", message);
                warnings.push(message);
                VisibilityPeriod::new(noon, noon + Duration::hours(24))
            }
        };

        let scan_window = full_window.and_then(|w| match request.now {
            Some(now) if now > w.start => VisibilityPeriod::new(now, w.end),
            _ => Some(w),
        });
        if full_window.is_some() && scan_window.is_none() {
            let message = format!("The night of {} is already over", request.date);
            warn!("{}", message);
            warnings.push(message);
        }

        let moon_phase = moon_phase_details(midnight);
        info!(
            "Planning {} objects for {} (Moon {:.0}% illuminated)",
            catalog.len(),
            request.date,
            moon_phase.illumination * 100.0
        );

        let reports: Vec<ObjectReport> = catalog
            .par_iter()
            .map(|object| self.annotate(object, scan_window, moon_phase.illumination))
            .collect();

        let mut annotations = BTreeMap::new();
        for (object, report) in catalog.iter().zip(reports) {
            warnings.extend(report.warning);
            annotations.insert(object.id, report.annotations);
        }

        let min_visibility = self.config.min_visibility();
        let mut visible_sufficient = Vec::new();
        let mut visible_insufficient = Vec::new();
        let mut rejected = Vec::new();
        for object in catalog {
            let Some(a) = annotations.get(&object.id) else {
                continue;
            };
            if object.magnitude.is_none() {
                rejected.push(RejectedObject {
                    id: object.id,
                    name: object.name.clone(),
                    reason: ExclusionReason::MissingMagnitude,
                });
                continue;
            }
            let visible = a
                .visibility_periods
                .iter()
                .any(|p| p.duration() >= min_visibility);
            match (visible, a.sufficient_time) {
                (true, Some(true)) => visible_sufficient.push(object.id),
                (true, _) => visible_insufficient.push(object.id),
                _ => {}
            }
        }
        if !rejected.is_empty() {
            let message = format!(
                "{} objects have no magnitude and were left out of exposure planning",
                rejected.len()
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let groups = if self.config.mosaic.enabled {
            self.find_groups(catalog, &annotations)
        } else {
            Vec::new()
        };

        let targets = self.schedule_targets(catalog, &annotations, &groups);
        let strategies = if request.strategies.is_empty() {
            vec![self.config.scheduling.strategy]
        } else {
            request.strategies.clone()
        };
        let schedules = strategies
            .into_iter()
            .map(|strategy| self.scheduler.schedule(strategy, &targets))
            .collect();

        info!(
            "{} visible with enough time, {} visible without, {} rejected, {} mosaic groups",
            visible_sufficient.len(),
            visible_insufficient.len(),
            rejected.len(),
            groups.len()
        );

        NightPlan {
            date: request.date,
            night,
            astronomical_twilight,
            scan_window,
            moon_phase_tier: moon_phase.tier(),
            moon_phase,
            annotations,
            visible_sufficient,
            visible_insufficient,
            rejected,
            warnings,
            groups,
            schedules,
        }
    }

    /// Visibility, exposure and Moon interference for one object.
    fn annotate(
        &self,
        object: &CelestialObject,
        scan_window: Option<VisibilityPeriod>,
        phase: f64,
    ) -> ObjectReport {
        let window = scan_window
            .map(|w| {
                self.visibility.find_window(
                    object.ra,
                    object.dec,
                    w.start,
                    w.end,
                    self.config.visibility.use_margins,
                )
            })
            .unwrap_or_default();

        let exposure = self.exposure.plan(object);
        let visible_hours = duration_to_hours(total_duration(&window.periods));
        let sufficient_time = exposure
            .requirement
            .map(|r| has_sufficient_time(&window.periods, self.config.min_visibility(), &r));

        let moon = self.moon.analyze(
            EquatorialCoords {
                ra: object.ra,
                dec: object.dec,
            },
            object.magnitude,
            &window.periods,
            phase,
        );

        debug!(
            "{}: {} periods, {:.2} h visible, {:.0} min near the Moon",
            object.name,
            window.periods.len(),
            visible_hours,
            moon.total_minutes
        );

        ObjectReport {
            annotations: ObjectAnnotations {
                visibility_periods: window.periods,
                visible_hours,
                max_altitude: window.max_altitude,
                sufficient_time,
                required_exposure: exposure.requirement,
                moon,
            },
            warning: exposure.fov_warning,
        }
    }

    fn find_groups(
        &self,
        catalog: &[CelestialObject],
        annotations: &BTreeMap<ObjectId, ObjectAnnotations>,
    ) -> Vec<MosaicGroup> {
        let visibility: HashMap<ObjectId, Vec<VisibilityPeriod>> = annotations
            .iter()
            .map(|(id, a)| (*id, a.visibility_periods.clone()))
            .collect();
        let groups = self.mosaic.find_groups(catalog, &visibility);
        debug!("Found {} mosaic groups", groups.len());
        groups
    }

    /// Scheduler input: every object with some visibility, plus the groups.
    fn schedule_targets(
        &self,
        catalog: &[CelestialObject],
        annotations: &BTreeMap<ObjectId, ObjectAnnotations>,
        groups: &[MosaicGroup],
    ) -> Vec<ScheduleTarget> {
        let singles = catalog.iter().filter_map(|object| {
            let a = annotations.get(&object.id)?;
            if a.visibility_periods.is_empty() {
                return None;
            }
            Some(ScheduleTarget {
                target: Target::Single(object.clone()),
                periods: a.visibility_periods.clone(),
                max_altitude: a.max_altitude,
                exposure: a.required_exposure,
            })
        });

        let grouped = groups.iter().map(|group| {
            let max_altitude = group
                .members
                .iter()
                .filter_map(|m| annotations.get(&m.id).and_then(|a| a.max_altitude))
                .reduce(f64::min);
            ScheduleTarget {
                target: Target::Group(group.clone()),
                periods: group.overlap_periods.clone(),
                max_altitude,
                exposure: group.magnitude.map(|m| self.exposure.for_fov(&group.fov, m)),
            }
        });

        singles.chain(grouped).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExposureRequirement;
    use chrono::TimeZone;

    fn la_palma() -> NightPlanner {
        NightPlanner::new(PlannerConfig::new(28.7624, -17.8892)).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_short_periods_do_not_count_as_sufficient_time() {
        let planner = la_palma();
        let min_visibility = planner.config().min_visibility();
        assert_eq!(min_visibility, Duration::hours(2));

        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let periods = vec![
            VisibilityPeriod::new(t0, t0 + Duration::minutes(150)).unwrap(),
            VisibilityPeriod::new(t0 + Duration::hours(4), t0 + Duration::minutes(330)).unwrap(),
        ];
        let object = CelestialObject::new(ObjectId::new(0), "Split", 5.5, 20.0, None, Some(9.0));

        for (hours, sufficient) in [(3.5, false), (2.2, true)] {
            let exposure = ExposureRequirement {
                total_hours: hours,
                frame_count: 1,
                panels: 1,
            };
            // Four hours in total, but only the 2.5 h period qualifies
            assert_eq!(has_sufficient_time(&periods, min_visibility, &exposure), sufficient);

            let targets = vec![ScheduleTarget {
                target: Target::Single(object.clone()),
                periods: periods.clone(),
                max_altitude: Some(60.0),
                exposure: Some(exposure),
            }];
            for strategy in SchedulingStrategy::ALL {
                let schedule = planner.scheduler.schedule(strategy, &targets);
                assert_eq!(schedule.len() == 1, sufficient, "{}", strategy);
                if !sufficient {
                    assert_eq!(schedule.excluded[0].reason, ExclusionReason::InsufficientTime);
                }
            }
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = PlannerConfig::new(28.7, -17.9);
        config.imaging.bortle = 0;
        assert!(NightPlanner::new(config).is_err());
    }

    #[test]
    fn test_empty_catalog_is_a_valid_plan() {
        let plan = la_palma().plan(&[], &PlanRequest::for_date(date(2024, 1, 15)));
        assert!(plan.night.is_some());
        assert!(plan.astronomical_twilight.is_some());
        assert!(plan.nothing_visible());
        assert!(plan.rejected.is_empty());
        assert_eq!(plan.schedules.len(), 1);
        assert!(plan.schedules[0].is_empty());
    }

    #[test]
    fn test_now_inside_night_moves_scan_start() {
        let now = Utc.with_ymd_and_hms(2024, 1, 16, 1, 0, 0).unwrap();
        let request = PlanRequest::for_date(date(2024, 1, 15)).with_now(now);
        let plan = la_palma().plan(&[], &request);
        assert_eq!(plan.scan_window.unwrap().start, now);
    }

    #[test]
    fn test_now_after_night_warns() {
        let now = Utc.with_ymd_and_hms(2024, 1, 17, 12, 0, 0).unwrap();
        let request = PlanRequest::for_date(date(2024, 1, 15)).with_now(now);
        let plan = la_palma().plan(&[], &request);
        assert!(plan.scan_window.is_none());
        assert!(!plan.warnings.is_empty());
    }

    #[test]
    fn test_missing_magnitude_is_rejected_not_defaulted() {
        let catalog = vec![CelestialObject::new(ObjectId::new(0), "Mystery", 5.5, 20.0, None, None)];
        let plan = la_palma().plan(&catalog, &PlanRequest::for_date(date(2024, 1, 15)));

        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].reason, RejectionReason::MissingMagnitude);
        let a = &plan.annotations[&ObjectId::new(0)];
        assert!(a.required_exposure.is_none());
        assert!(a.sufficient_time.is_none());
        assert!(plan.visible_sufficient.is_empty());
    }

    #[test]
    fn test_requested_strategies_each_get_a_schedule() {
        let request = PlanRequest::for_date(date(2024, 1, 15)).with_strategies(SchedulingStrategy::ALL);
        let plan = la_palma().plan(&[], &request);
        assert_eq!(plan.schedules.len(), 6);
        assert!(plan.schedule(SchedulingStrategy::MinimalMosaic).is_some());
    }
}
