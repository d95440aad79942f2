//! Strategy-dependent candidate scores. Higher is better.

use crate::models::{SchedulingStrategy, Target};

/// Inputs every strategy draws its score from.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    /// Total qualifying visibility, hours
    pub duration_hours: f64,
    /// Required integration time, hours
    pub required_hours: f64,
    /// Degrees; `None` when unknown
    pub max_altitude: Option<f64>,
    pub magnitude: Option<f64>,
    pub panels: u32,
}

/// Slack added to the MaxObjects denominator, hours.
const MAX_OBJECTS_EPSILON_HOURS: f64 = 0.01;

/// Cap on how much spare visibility DifficultyBalanced rewards.
const FEASIBILITY_CAP: f64 = 3.0;

pub fn score(strategy: SchedulingStrategy, target: &Target, inputs: &ScoreInputs) -> f64 {
    match strategy {
        SchedulingStrategy::LongestDuration => inputs.duration_hours,
        SchedulingStrategy::MaxObjects => {
            1.0 / ((inputs.duration_hours - inputs.required_hours).abs() + MAX_OBJECTS_EPSILON_HOURS)
        }
        SchedulingStrategy::OptimalSnr => {
            let altitude = inputs.max_altitude.unwrap_or(0.0).max(0.0);
            let magnitude = inputs.magnitude.unwrap_or(20.0);
            (altitude / 90.0) * (20.0 - magnitude) / 20.0
        }
        SchedulingStrategy::MinimalMosaic => 1.0 / inputs.panels.max(1) as f64,
        SchedulingStrategy::DifficultyBalanced => {
            let feasibility = if inputs.required_hours > 0.0 {
                (inputs.duration_hours / inputs.required_hours).min(FEASIBILITY_CAP)
            } else {
                FEASIBILITY_CAP
            };
            feasibility / (1.0 + inputs.required_hours)
        }
        SchedulingStrategy::MosaicGroups => match target {
            Target::Group(g) => g.object_count() as f64 * inputs.duration_hours * 10.0,
            Target::Single(_) => inputs.duration_hours,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CelestialObject, FieldOfView, MosaicGroup, ObjectId};
    use approx::assert_abs_diff_eq;

    fn single() -> Target {
        CelestialObject::new(ObjectId::new(0), "M1", 5.5, 22.0, None, Some(8.0)).into()
    }

    fn inputs(duration: f64, required: f64) -> ScoreInputs {
        ScoreInputs {
            duration_hours: duration,
            required_hours: required,
            max_altitude: Some(72.0),
            magnitude: Some(8.0),
            panels: 2,
        }
    }

    #[test]
    fn test_max_objects_prefers_tight_fit() {
        let tight = score(SchedulingStrategy::MaxObjects, &single(), &inputs(2.0, 2.0));
        let loose = score(SchedulingStrategy::MaxObjects, &single(), &inputs(6.0, 2.0));
        assert_abs_diff_eq!(tight, 100.0, epsilon = 1e-9);
        assert!(tight > loose);
    }

    #[test]
    fn test_optimal_snr() {
        let s = score(SchedulingStrategy::OptimalSnr, &single(), &inputs(3.0, 1.0));
        assert_abs_diff_eq!(s, 0.8 * 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_minimal_mosaic_and_longest_duration() {
        assert_eq!(score(SchedulingStrategy::MinimalMosaic, &single(), &inputs(3.0, 1.0)), 0.5);
        assert_eq!(score(SchedulingStrategy::LongestDuration, &single(), &inputs(3.0, 1.0)), 3.0);
    }

    #[test]
    fn test_difficulty_balanced_caps_feasibility() {
        let s = score(SchedulingStrategy::DifficultyBalanced, &single(), &inputs(10.0, 1.0));
        assert_abs_diff_eq!(s, 3.0 / 2.0, epsilon = 1e-12);
        let hard = score(SchedulingStrategy::DifficultyBalanced, &single(), &inputs(4.0, 4.0));
        assert_abs_diff_eq!(hard, 1.0 / 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mosaic_groups_favour_groups() {
        let members = vec![
            CelestialObject::new(ObjectId::new(1), "A", 5.0, 20.0, None, Some(8.0)),
            CelestialObject::new(ObjectId::new(2), "B", 5.05, 20.5, None, Some(9.0)),
        ];
        let group: Target = MosaicGroup::new(members, vec![], FieldOfView::from_degrees(3.0, 2.0)).into();

        let g = score(SchedulingStrategy::MosaicGroups, &group, &inputs(2.0, 1.0));
        let s = score(SchedulingStrategy::MosaicGroups, &single(), &inputs(5.0, 1.0));
        assert_eq!(g, 40.0);
        assert_eq!(s, 5.0);
    }
}
