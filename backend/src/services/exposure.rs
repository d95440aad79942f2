//! Exposure and mosaic panel estimates.
//!
//! Required integration time follows an exponential law in magnitude and a
//! quadratic law in sky brightness, normalised so that a magnitude 10 object
//! under a Bortle 4 sky needs one hour per panel.

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::models::{CelestialObject, ExposureRequirement, FieldOfView};
use std::str::FromStr;

/// Fraction of the instrument field used per panel (10% overlap between tiles).
pub const PANEL_COVERAGE: f64 = 0.9;

/// Panels needed to tile `fov` with an instrument of field `scope`.
pub fn panels_for_fov(fov: &FieldOfView, scope: &FieldOfView) -> u32 {
    let across = (fov.width.value() / (scope.width.value() * PANEL_COVERAGE)).ceil();
    let down = (fov.height.value() / (scope.height.value() * PANEL_COVERAGE)).ceil();
    ((across.max(1.0) * down.max(1.0)) as u32).max(1)
}

/// Panels needed for an object's apparent size string.
///
/// Objects without a size need one panel. An unparsable size is an error; the
/// caller decides whether to degrade to one panel.
pub fn required_panels(fov: Option<&str>, scope: &FieldOfView) -> Result<u32> {
    match fov {
        None => Ok(1),
        Some(s) => Ok(panels_for_fov(&FieldOfView::from_str(s)?, scope)),
    }
}

/// Integration time, frame count and panels for one target.
pub fn required_exposure(
    magnitude: f64,
    bortle: u8,
    panels: u32,
    single_exposure_seconds: f64,
) -> ExposureRequirement {
    let magnitude_factor = 2_f64.powf((magnitude - 10.0) / 2.5);
    let sky_factor = (bortle as f64 / 4.0).powi(2);
    let total_hours = magnitude_factor * sky_factor * panels as f64;

    let frame_count = if single_exposure_seconds > 0.0 {
        (total_hours * 3600.0 / single_exposure_seconds).ceil() as u32
    } else {
        0
    };

    ExposureRequirement {
        total_hours,
        frame_count,
        panels,
    }
}

/// Exposure estimate for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposurePlan {
    /// `None` when the object has no magnitude
    pub requirement: Option<ExposureRequirement>,
    /// Set when the size string could not be parsed and one panel was assumed
    pub fov_warning: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExposurePlanner {
    instrument: FieldOfView,
    bortle: u8,
    single_exposure_seconds: f64,
}

impl ExposurePlanner {
    pub fn new(instrument: FieldOfView, bortle: u8, single_exposure_seconds: f64) -> Self {
        Self {
            instrument,
            bortle,
            single_exposure_seconds,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.instrument_fov(),
            config.imaging.bortle,
            config.imaging.single_exposure.value(),
        )
    }

    /// Requirement for a target with a known size and magnitude.
    pub fn for_fov(&self, fov: &FieldOfView, magnitude: f64) -> ExposureRequirement {
        let panels = panels_for_fov(fov, &self.instrument);
        required_exposure(magnitude, self.bortle, panels, self.single_exposure_seconds)
    }

    pub fn plan(&self, object: &CelestialObject) -> ExposurePlan {
        let (panels, fov_warning) = match required_panels(object.fov.as_deref(), &self.instrument) {
            Ok(p) => (p, None),
            Err(e) => (1, Some(format!("{}: {}, assuming one panel", object.name, e))),
        };

        ExposurePlan {
            requirement: object
                .magnitude
                .map(|m| required_exposure(m, self.bortle, panels, self.single_exposure_seconds)),
            fov_warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectId;
    use approx::assert_abs_diff_eq;

    fn scope() -> FieldOfView {
        FieldOfView::from_degrees(1.0, 1.0)
    }

    #[test]
    fn test_reference_point_is_one_hour() {
        let req = required_exposure(10.0, 4, 1, 300.0);
        assert_abs_diff_eq!(req.total_hours, 1.0, epsilon = 1e-12);
        assert_eq!(req.panels, 1);
        assert_eq!(req.frame_count, 12);
    }

    #[test]
    fn test_doubling_panels_doubles_exposure() {
        for mag in [6.0, 8.5, 11.0, 13.2] {
            let one = required_exposure(mag, 5, 3, 180.0);
            let two = required_exposure(mag, 5, 6, 180.0);
            assert_abs_diff_eq!(two.total_hours, 2.0 * one.total_hours, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_magnitude_and_sky_scaling() {
        let faint = required_exposure(12.5, 4, 1, 300.0);
        assert_abs_diff_eq!(faint.total_hours, 2.0, epsilon = 1e-12);
        let city = required_exposure(10.0, 8, 1, 300.0);
        assert_abs_diff_eq!(city.total_hours, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_count_rounds_up() {
        let req = required_exposure(10.0, 4, 1, 7.0 * 60.0);
        assert_eq!(req.frame_count, 9);
    }

    #[test]
    fn test_panels_grid() {
        // 0.9° usable per tile
        assert_eq!(panels_for_fov(&FieldOfView::from_degrees(0.9, 0.9), &scope()), 1);
        assert_eq!(panels_for_fov(&FieldOfView::from_degrees(0.91, 0.5), &scope()), 2);
        assert_eq!(panels_for_fov(&FieldOfView::from_degrees(3.0, 1.0), &scope()), 8);
        assert_eq!(panels_for_fov(&FieldOfView::from_arcminutes(10.0, 5.0), &scope()), 1);
    }

    #[test]
    fn test_required_panels_from_strings() {
        assert_eq!(required_panels(Some("178'x63'"), &scope()).unwrap(), 8);
        assert_eq!(required_panels(None, &scope()).unwrap(), 1);
        assert!(required_panels(Some("big"), &scope()).is_err());
    }

    #[test]
    fn test_plan_degrades_malformed_fov_with_warning() {
        let planner = ExposurePlanner::new(scope(), 4, 300.0);
        let object = CelestialObject::new(ObjectId::new(0), "NGC 1", 0.1, 27.7, Some("??".into()), Some(10.0));
        let plan = planner.plan(&object);
        assert_eq!(plan.requirement.unwrap().panels, 1);
        assert!(plan.fov_warning.unwrap().contains("NGC 1"));
    }

    #[test]
    fn test_plan_without_magnitude_has_no_requirement() {
        let planner = ExposurePlanner::new(scope(), 4, 300.0);
        let object = CelestialObject::new(ObjectId::new(0), "IC 1", 0.2, 10.0, None, None);
        let plan = planner.plan(&object);
        assert!(plan.requirement.is_none());
        assert!(plan.fov_warning.is_none());
    }
}
