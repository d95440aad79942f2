//! Property tests for the scheduler and the mosaic grouper.

mod support;

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use proptest::prelude::*;

use nightplan::models::{
    CelestialObject, ExposureRequirement, FieldOfView, ObjectId, SchedulingStrategy, Target,
    VisibilityPeriod,
};
use nightplan::scheduler::{ScheduleTarget, SchedulerSettings};
use nightplan::services::mosaic::{angular_extent, MosaicGrouper, MOSAIC_FILL_FACTOR};
use nightplan::{find_conflicts, Scheduler};

use support::{at, within_periods};

/// (start offset, length) in minutes from 19:00, magnitude, required hours.
fn target_strategy() -> impl Strategy<Value = (i64, i64, f64, f64)> {
    (0i64..600, 30i64..480, 4.0f64..12.0, 0.1f64..4.0)
}

fn build_targets(specs: &[(i64, i64, f64, f64)]) -> Vec<ScheduleTarget> {
    let base = at(15, 19, 0);
    specs
        .iter()
        .enumerate()
        .map(|(i, &(offset, length, magnitude, required))| {
            let start = base + Duration::minutes(offset);
            let period = VisibilityPeriod::new(start, start + Duration::minutes(length)).unwrap();
            ScheduleTarget {
                target: Target::Single(CelestialObject::new(
                    ObjectId::new(i),
                    format!("T{}", i),
                    (i as f64 * 1.3) % 24.0,
                    10.0,
                    None,
                    Some(magnitude),
                )),
                periods: vec![period],
                max_altitude: Some(40.0 + (i % 5) as f64 * 10.0),
                exposure: Some(ExposureRequirement {
                    total_hours: required,
                    frame_count: (required * 12.0).ceil() as u32,
                    panels: 1 + (i % 3) as u32,
                }),
            }
        })
        .collect()
}

fn scheduler(max_overlap_minutes: f64, exclude_insufficient_time: bool) -> Scheduler {
    Scheduler::new(SchedulerSettings {
        max_overlap_minutes,
        exclude_insufficient_time,
        slot_step: Duration::minutes(15),
        gap_threshold: Duration::minutes(30),
        min_visibility: Duration::minutes(30),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_schedules_respect_tolerance_and_windows(
        specs in prop::collection::vec(target_strategy(), 0..12),
        tolerance in 0.0f64..20.0,
        exclude in any::<bool>(),
    ) {
        let targets = build_targets(&specs);
        let scheduler = scheduler(tolerance, exclude);

        for strategy in SchedulingStrategy::ALL {
            let schedule = scheduler.schedule(strategy, &targets);

            prop_assert!(find_conflicts(&schedule.entries, tolerance).is_empty());
            // Every target is either scheduled or explained
            prop_assert_eq!(schedule.entries.len() + schedule.excluded.len(), targets.len());

            let mut seen = HashSet::new();
            for entry in &schedule.entries {
                prop_assert!(entry.start < entry.end);
                let id = entry.target.member_ids()[0];
                prop_assert!(seen.insert(id));
                prop_assert!(within_periods(entry, &targets[id.value()].periods));
            }
        }
    }

    #[test]
    fn prop_max_objects_never_overlaps(
        specs in prop::collection::vec(target_strategy(), 1..12),
        tolerance in 0.0f64..30.0,
    ) {
        let targets = build_targets(&specs);
        let schedule = scheduler(tolerance, true).schedule(SchedulingStrategy::MaxObjects, &targets);
        prop_assert!(find_conflicts(&schedule.entries, 0.0).is_empty());
    }

    #[test]
    fn prop_mosaic_groups_fit_the_frame(
        positions in prop::collection::vec((-1.0f64..1.0, -0.8f64..0.8), 2..10),
        centre_ra in prop_oneof![Just(0.0f64), 0.0f64..24.0],
        centre_dec in prop_oneof![-60.0f64..60.0, 75.0f64..89.0, -89.0f64..-75.0],
    ) {
        let fov = FieldOfView::from_degrees(2.4, 1.6);
        let window = vec![VisibilityPeriod::new(at(15, 20, 0), at(16, 2, 0)).unwrap()];

        let objects: Vec<CelestialObject> = positions
            .iter()
            .enumerate()
            .map(|(i, &(dra, ddec))| {
                // Offsets of about one frame width on the sky, so polar
                // clusters spread over many degrees of RA.
                let ra_offset_deg = dra * 1.2 / centre_dec.to_radians().cos().max(0.05);
                CelestialObject::new(
                    ObjectId::new(i),
                    format!("O{}", i),
                    (centre_ra + ra_offset_deg / 15.0).rem_euclid(24.0),
                    (centre_dec + ddec).clamp(-90.0, 90.0),
                    None,
                    Some(9.0),
                )
            })
            .collect();
        let visibility: HashMap<ObjectId, Vec<VisibilityPeriod>> =
            objects.iter().map(|o| (o.id, window.clone())).collect();

        let groups = MosaicGrouper::new(fov, 4, Duration::hours(1)).find_groups(&objects, &visibility);

        let mut used = HashSet::new();
        for group in &groups {
            prop_assert!(group.object_count() >= 2 && group.object_count() <= 4);
            let members: Vec<&CelestialObject> = group.members.iter().collect();
            let (width, height) = angular_extent(&members);
            prop_assert!(width <= 2.4 * MOSAIC_FILL_FACTOR + 1e-9);
            prop_assert!(height <= 1.6 * MOSAIC_FILL_FACTOR + 1e-9);
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    let (w, h) = angular_extent(&[*a, *b]);
                    prop_assert!(w <= 2.4 * MOSAIC_FILL_FACTOR + 1e-9, "{} and {} span {} deg", a.name, b.name, w);
                    prop_assert!(h <= 1.6 * MOSAIC_FILL_FACTOR + 1e-9);
                }
            }
            for id in group.member_ids() {
                prop_assert!(used.insert(id), "object {} in two groups", id);
            }
        }
    }
}
