//! Mosaic grouping.
//!
//! Objects close enough on the sky to share one mosaic frame, and visible at
//! the same time for long enough, are merged into a [`MosaicGroup`].
//! The search is greedy and first-found: larger groups are tried first, each
//! seed grows object by object while both the spatial and the temporal test
//! hold, and committed members are never reused.

use chrono::Duration;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use crate::config::PlannerConfig;
use crate::models::{
    intersect_periods, total_duration, CelestialObject, FieldOfView, MosaicGroup, ObjectId,
    VisibilityPeriod,
};

/// Fraction of the mosaic frame the members may span.
pub const MOSAIC_FILL_FACTOR: f64 = 0.9;

/// Smallest arc (radians) of the RA circle covering every value.
///
/// Equal to `2π` minus the largest gap between consecutive sorted RAs, which
/// handles clusters straddling 0h/24h.
pub fn ra_span(ras: &[f64]) -> f64 {
    if ras.len() < 2 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = ras.iter().map(|ra| ra.rem_euclid(TAU)).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let wrap_gap = sorted[0] + TAU - sorted[sorted.len() - 1];
    let largest_gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(wrap_gap, f64::max);

    TAU - largest_gap
}

/// Angular extent `(width, height)` in degrees of a set of objects, with the
/// RA span projected by the cosine of the mean declination.
pub fn angular_extent(members: &[&CelestialObject]) -> (f64, f64) {
    if members.is_empty() {
        return (0.0, 0.0);
    }
    let ras: Vec<f64> = members.iter().map(|m| m.ra).collect();
    let mean_dec = members.iter().map(|m| m.dec).sum::<f64>() / members.len() as f64;

    let width = ra_span(&ras).to_degrees() * mean_dec.cos().abs();

    let (min_dec, max_dec) = members.iter().fold((f64::MAX, f64::MIN), |(lo, hi), m| {
        (lo.min(m.dec), hi.max(m.dec))
    });
    let height = (max_dec - min_dec).to_degrees();

    (width, height)
}

fn extent_fits(extent: (f64, f64), mosaic_fov: &FieldOfView) -> bool {
    extent.0 <= mosaic_fov.width.value() * MOSAIC_FILL_FACTOR
        && extent.1 <= mosaic_fov.height.value() * MOSAIC_FILL_FACTOR
}

/// Whether the members fit inside 90% of the mosaic frame.
///
/// Every pair must fit at its own mean declination as well as the whole
/// set: a pair nearer the equator than the group mean projects a wider RA
/// span than the group does.
pub fn spatial_fit(members: &[&CelestialObject], mosaic_fov: &FieldOfView) -> bool {
    if !extent_fits(angular_extent(members), mosaic_fov) {
        return false;
    }
    members.iter().enumerate().all(|(i, a)| {
        members[i + 1..]
            .iter()
            .all(|b| extent_fits(angular_extent(&[*a, *b]), mosaic_fov))
    })
}

/// Running intersection of several period lists.
pub fn temporal_overlap(period_lists: &[&[VisibilityPeriod]]) -> Vec<VisibilityPeriod> {
    let mut lists = period_lists.iter();
    let Some(first) = lists.next() else {
        return Vec::new();
    };
    lists.fold(first.to_vec(), |acc, next| intersect_periods(&acc, next))
}

#[derive(Debug, Clone)]
pub struct MosaicGrouper {
    mosaic_fov: FieldOfView,
    max_group_size: usize,
    min_overlap: Duration,
}

impl MosaicGrouper {
    pub fn new(mosaic_fov: FieldOfView, max_group_size: usize, min_overlap: Duration) -> Self {
        Self {
            mosaic_fov,
            max_group_size,
            min_overlap,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.mosaic_fov(),
            config.mosaic.max_group_size,
            config.min_mosaic_overlap(),
        )
    }

    /// Group `objects` using their visibility periods.
    ///
    /// Objects without an entry in `visibility` (or with no periods) never join
    /// a group. Output order follows the search: larger tiers first, then
    /// catalog order of the seeds.
    pub fn find_groups(
        &self,
        objects: &[CelestialObject],
        visibility: &HashMap<ObjectId, Vec<VisibilityPeriod>>,
    ) -> Vec<MosaicGroup> {
        let candidates: Vec<(&CelestialObject, &[VisibilityPeriod])> = objects
            .iter()
            .filter_map(|o| {
                visibility
                    .get(&o.id)
                    .filter(|p| !p.is_empty())
                    .map(|p| (o, p.as_slice()))
            })
            .collect();

        let mut used: HashSet<ObjectId> = HashSet::new();
        let mut groups = Vec::new();

        for tier in (2..=self.max_group_size).rev() {
            for (seed_index, (seed, seed_periods)) in candidates.iter().enumerate() {
                if used.contains(&seed.id) {
                    continue;
                }

                let mut members: Vec<&CelestialObject> = vec![*seed];
                let mut overlap: Vec<VisibilityPeriod> = seed_periods.to_vec();

                for (other, other_periods) in candidates.iter().skip(seed_index + 1) {
                    if members.len() == tier {
                        break;
                    }
                    if used.contains(&other.id) {
                        continue;
                    }

                    members.push(*other);
                    if !spatial_fit(&members, &self.mosaic_fov) {
                        members.pop();
                        continue;
                    }

                    let joint = intersect_periods(&overlap, other_periods);
                    if joint.is_empty() || total_duration(&joint) < self.min_overlap {
                        members.pop();
                        continue;
                    }
                    overlap = joint;
                }

                if members.len() == tier {
                    used.extend(members.iter().map(|m| m.id));
                    let group = MosaicGroup::new(
                        members.into_iter().cloned().collect(),
                        overlap,
                        self.mosaic_fov,
                    );
                    debug!("Formed {} ({} members)", group.name, tier);
                    groups.push(group);
                }
            }
        }

        groups
    }
}
