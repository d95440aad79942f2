//! Schedulable targets: single catalog objects or mosaic groups.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::object::{CelestialObject, FieldOfView, ObjectId};
use super::period::{total_duration, VisibilityPeriod};
use chrono::Duration;

/// Several catalog objects imaged together in one wider mosaic frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosaicGroup {
    pub members: Vec<CelestialObject>,
    /// Periods during which *all* members are visible at once
    pub overlap_periods: Vec<VisibilityPeriod>,
    pub name: String,
    /// Centroid right ascension in radians
    pub ra: f64,
    /// Centroid declination in radians
    pub dec: f64,
    /// Mean magnitude of the two brightest members
    pub magnitude: Option<f64>,
    /// The instrument's mosaic field of view
    pub fov: FieldOfView,
}

impl MosaicGroup {
    pub fn new(
        members: Vec<CelestialObject>,
        overlap_periods: Vec<VisibilityPeriod>,
        mosaic_fov: FieldOfView,
    ) -> Self {
        let name = format!(
            "Mosaic: {}",
            members
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>()
                .join(" + ")
        );
        let (ra, dec) = centroid(&members);
        let magnitude = composite_magnitude(&members);

        Self {
            members,
            overlap_periods,
            name,
            ra,
            dec,
            magnitude,
            fov: mosaic_fov,
        }
    }

    pub fn object_count(&self) -> usize {
        self.members.len()
    }

    pub fn member_ids(&self) -> Vec<ObjectId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn overlap_duration(&self) -> Duration {
        total_duration(&self.overlap_periods)
    }

    /// Area of the synthetic mosaic frame in square arcminutes.
    pub fn total_area(&self) -> f64 {
        self.fov.area_arcmin2()
    }
}

/// Circular mean of RA, arithmetic mean of Dec.
fn centroid(members: &[CelestialObject]) -> (f64, f64) {
    if members.is_empty() {
        return (0.0, 0.0);
    }
    let (sin_sum, cos_sum) = members
        .iter()
        .fold((0.0, 0.0), |(s, c), m| (s + m.ra.sin(), c + m.ra.cos()));
    let ra = sin_sum.atan2(cos_sum).rem_euclid(TAU);
    let dec = members.iter().map(|m| m.dec).sum::<f64>() / members.len() as f64;
    (ra, dec)
}

fn composite_magnitude(members: &[CelestialObject]) -> Option<f64> {
    let mut mags: Vec<f64> = members.iter().filter_map(|m| m.magnitude).collect();
    if mags.is_empty() {
        return None;
    }
    mags.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let brightest = &mags[..mags.len().min(2)];
    Some(brightest.iter().sum::<f64>() / brightest.len() as f64)
}

/// Anything the scheduler can point the telescope at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Single(CelestialObject),
    Group(MosaicGroup),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Single(o) => &o.name,
            Target::Group(g) => &g.name,
        }
    }

    pub fn ra(&self) -> f64 {
        match self {
            Target::Single(o) => o.ra,
            Target::Group(g) => g.ra,
        }
    }

    pub fn dec(&self) -> f64 {
        match self {
            Target::Single(o) => o.dec,
            Target::Group(g) => g.dec,
        }
    }

    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Target::Single(o) => o.magnitude,
            Target::Group(g) => g.magnitude,
        }
    }

    pub fn fov(&self) -> Option<FieldOfView> {
        match self {
            Target::Single(o) => o.parsed_fov(),
            Target::Group(g) => Some(g.fov),
        }
    }

    pub fn total_area(&self) -> f64 {
        match self {
            Target::Single(o) => o.total_area(),
            Target::Group(g) => g.total_area(),
        }
    }

    pub fn object_count(&self) -> usize {
        match self {
            Target::Single(_) => 1,
            Target::Group(g) => g.object_count(),
        }
    }

    /// Catalog objects covered by this target.
    pub fn member_ids(&self) -> Vec<ObjectId> {
        match self {
            Target::Single(o) => vec![o.id],
            Target::Group(g) => g.member_ids(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Target::Group(_))
    }
}

impl From<CelestialObject> for Target {
    fn from(o: CelestialObject) -> Self {
        Target::Single(o)
    }
}

impl From<MosaicGroup> for Target {
    fn from(g: MosaicGroup) -> Self {
        Target::Group(g)
    }
}
