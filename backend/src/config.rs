//! Planner configuration file support.
//!
//! Every tunable of the pipeline lives in one TOML document, split into
//! sections. Only `[observer]` is mandatory; all other sections and fields
//! fall back to defaults.
//!
//! ```toml
//! [observer]
//! latitude = 28.76
//! longitude = -17.89
//!
//! [visibility]
//! min_altitude = 30.0
//!
//! [imaging]
//! bortle = 4
//! fov_width = 1.2
//! fov_height = 0.8
//!
//! [scheduling]
//! strategy = "max_objects"
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::astro::MoonPrecision;
use crate::error::{PlannerError, Result};
use crate::models::{hours_to_duration, FieldOfView, Observer, SchedulingStrategy};

/// Full planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub observer: ObserverSettings,
    #[serde(default)]
    pub visibility: VisibilitySettings,
    #[serde(default)]
    pub twilight: TwilightSettings,
    #[serde(default)]
    pub imaging: ImagingSettings,
    #[serde(default)]
    pub moon: MoonSettings,
    #[serde(default)]
    pub mosaic: MosaicSettings,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
}

/// Observer location, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverSettings {
    pub latitude: qtty::Degrees,
    /// East positive
    pub longitude: qtty::Degrees,
}

/// Altitude/azimuth band and sampling of the visibility search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySettings {
    #[serde(default = "default_min_altitude")]
    pub min_altitude: qtty::Degrees,
    #[serde(default = "default_max_altitude")]
    pub max_altitude: qtty::Degrees,
    #[serde(default = "default_min_azimuth")]
    pub min_azimuth: qtty::Degrees,
    #[serde(default = "default_max_azimuth")]
    pub max_azimuth: qtty::Degrees,
    /// Widen the band by the visibility margin on every side
    #[serde(default)]
    pub use_margins: bool,
    #[serde(default = "default_min_visibility_hours")]
    pub min_visibility_hours: qtty::Hours,
    #[serde(default = "default_sample_interval_minutes")]
    pub sample_interval_minutes: u32,
}

/// Sunset/sunrise and twilight search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwilightSettings {
    #[serde(default = "default_twilight_step_minutes")]
    pub step_minutes: u32,
    /// Refine crossings numerically and use the stricter darkness threshold
    #[serde(default)]
    pub precise: bool,
}

/// Sky and instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagingSettings {
    #[serde(default = "default_bortle")]
    pub bortle: u8,
    #[serde(default = "default_fov_width")]
    pub fov_width: qtty::Degrees,
    #[serde(default = "default_fov_height")]
    pub fov_height: qtty::Degrees,
    #[serde(default = "default_mosaic_fov_width")]
    pub mosaic_fov_width: qtty::Degrees,
    #[serde(default = "default_mosaic_fov_height")]
    pub mosaic_fov_height: qtty::Degrees,
    #[serde(default = "default_single_exposure")]
    pub single_exposure: qtty::Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonSettings {
    #[serde(default)]
    pub precision: MoonPrecision,
    /// Interference shorter than this does not flag an object
    #[serde(default = "default_min_interference_minutes")]
    pub min_interference_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MosaicSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_group_size")]
    pub max_group_size: usize,
    /// Minimum joint visibility of a group; defaults to the minimum visibility
    #[serde(default)]
    pub min_overlap_hours: Option<qtty::Hours>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingSettings {
    #[serde(default)]
    pub strategy: SchedulingStrategy,
    #[serde(default = "default_max_overlap_minutes")]
    pub max_overlap_minutes: f64,
    #[serde(default = "default_true")]
    pub exclude_insufficient_time: bool,
    #[serde(default = "default_slot_step_minutes")]
    pub slot_step_minutes: u32,
    #[serde(default = "default_gap_threshold_minutes")]
    pub gap_threshold_minutes: f64,
}

fn default_min_altitude() -> qtty::Degrees {
    qtty::Degrees::new(30.0)
}

fn default_max_altitude() -> qtty::Degrees {
    qtty::Degrees::new(90.0)
}

fn default_min_azimuth() -> qtty::Degrees {
    qtty::Degrees::new(0.0)
}

fn default_max_azimuth() -> qtty::Degrees {
    qtty::Degrees::new(360.0)
}

fn default_min_visibility_hours() -> qtty::Hours {
    qtty::Hours::new(2.0)
}

fn default_sample_interval_minutes() -> u32 {
    1
}

fn default_twilight_step_minutes() -> u32 {
    2
}

fn default_bortle() -> u8 {
    4
}

fn default_fov_width() -> qtty::Degrees {
    qtty::Degrees::new(1.2)
}

fn default_fov_height() -> qtty::Degrees {
    qtty::Degrees::new(0.8)
}

fn default_mosaic_fov_width() -> qtty::Degrees {
    qtty::Degrees::new(2.4)
}

fn default_mosaic_fov_height() -> qtty::Degrees {
    qtty::Degrees::new(1.6)
}

fn default_single_exposure() -> qtty::Seconds {
    qtty::Seconds::new(300.0)
}

fn default_min_interference_minutes() -> f64 {
    15.0
}

fn default_true() -> bool {
    true
}

fn default_max_group_size() -> usize {
    4
}

fn default_max_overlap_minutes() -> f64 {
    5.0
}

fn default_slot_step_minutes() -> u32 {
    15
}

fn default_gap_threshold_minutes() -> f64 {
    30.0
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            min_altitude: default_min_altitude(),
            max_altitude: default_max_altitude(),
            min_azimuth: default_min_azimuth(),
            max_azimuth: default_max_azimuth(),
            use_margins: false,
            min_visibility_hours: default_min_visibility_hours(),
            sample_interval_minutes: default_sample_interval_minutes(),
        }
    }
}

impl Default for TwilightSettings {
    fn default() -> Self {
        Self {
            step_minutes: default_twilight_step_minutes(),
            precise: false,
        }
    }
}

impl Default for ImagingSettings {
    fn default() -> Self {
        Self {
            bortle: default_bortle(),
            fov_width: default_fov_width(),
            fov_height: default_fov_height(),
            mosaic_fov_width: default_mosaic_fov_width(),
            mosaic_fov_height: default_mosaic_fov_height(),
            single_exposure: default_single_exposure(),
        }
    }
}

impl Default for MoonSettings {
    fn default() -> Self {
        Self {
            precision: MoonPrecision::default(),
            min_interference_minutes: default_min_interference_minutes(),
        }
    }
}

impl Default for MosaicSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_group_size: default_max_group_size(),
            min_overlap_hours: None,
        }
    }
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            strategy: SchedulingStrategy::default(),
            max_overlap_minutes: default_max_overlap_minutes(),
            exclude_insufficient_time: true,
            slot_step_minutes: default_slot_step_minutes(),
            gap_threshold_minutes: default_gap_threshold_minutes(),
        }
    }
}

impl PlannerConfig {
    /// Configuration with default settings for an observer at the given
    /// latitude/longitude (degrees, east positive).
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            observer: ObserverSettings {
                latitude: qtty::Degrees::new(latitude),
                longitude: qtty::Degrees::new(longitude),
            },
            visibility: VisibilitySettings::default(),
            twilight: TwilightSettings::default(),
            imaging: ImagingSettings::default(),
            moon: MoonSettings::default(),
            mosaic: MosaicSettings::default(),
            scheduling: SchedulingSettings::default(),
        }
    }

    /// Load and validate a configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(PlannerConfig)` if the file was read, parsed and validated
    /// * `Err(PlannerError)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlannerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot describe a real observing session.
    pub fn validate(&self) -> Result<()> {
        self.observer()?;

        let v = &self.visibility;
        let (min_alt, max_alt) = (v.min_altitude.value(), v.max_altitude.value());
        if !(-90.0..=90.0).contains(&min_alt) || !(-90.0..=90.0).contains(&max_alt) {
            return invalid("Altitude limits must be between -90 and 90 degrees");
        }
        if min_alt > max_alt {
            return invalid(format!(
                "min_altitude ({}) is greater than max_altitude ({})",
                min_alt, max_alt
            ));
        }
        for az in [v.min_azimuth.value(), v.max_azimuth.value()] {
            if !(0.0..=360.0).contains(&az) {
                return invalid("Azimuth limits must be between 0 and 360 degrees");
            }
        }
        if v.min_visibility_hours.value() < 0.0 {
            return invalid("min_visibility_hours cannot be negative");
        }
        if v.sample_interval_minutes == 0 {
            return invalid("sample_interval_minutes must be positive");
        }

        if self.twilight.step_minutes == 0 {
            return invalid("twilight step_minutes must be positive");
        }

        let i = &self.imaging;
        if !(1..=9).contains(&i.bortle) {
            return invalid(format!("Bortle index must be between 1 and 9, got {}", i.bortle));
        }
        for (name, value) in [
            ("fov_width", i.fov_width.value()),
            ("fov_height", i.fov_height.value()),
            ("mosaic_fov_width", i.mosaic_fov_width.value()),
            ("mosaic_fov_height", i.mosaic_fov_height.value()),
            ("single_exposure", i.single_exposure.value()),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{} must be positive", name));
            }
        }

        if self.moon.min_interference_minutes < 0.0 {
            return invalid("min_interference_minutes cannot be negative");
        }

        if self.mosaic.max_group_size < 2 {
            return invalid("max_group_size must be at least 2");
        }
        if self.mosaic.min_overlap_hours.is_some_and(|h| h.value() < 0.0) {
            return invalid("min_overlap_hours cannot be negative");
        }

        let s = &self.scheduling;
        if s.max_overlap_minutes < 0.0 {
            return invalid("max_overlap_minutes cannot be negative");
        }
        if s.slot_step_minutes == 0 {
            return invalid("slot_step_minutes must be positive");
        }
        if s.gap_threshold_minutes < 0.0 {
            return invalid("gap_threshold_minutes cannot be negative");
        }

        Ok(())
    }

    pub fn observer(&self) -> Result<Observer> {
        Observer::from_degrees(
            self.observer.latitude.value(),
            self.observer.longitude.value(),
        )
    }

    /// Sun altitude (degrees) below which the sky counts as dark enough.
    pub fn dark_sun_altitude(&self) -> f64 {
        if self.twilight.precise {
            -12.0
        } else {
            -5.0
        }
    }

    pub fn instrument_fov(&self) -> FieldOfView {
        FieldOfView::new(self.imaging.fov_width, self.imaging.fov_height)
    }

    pub fn mosaic_fov(&self) -> FieldOfView {
        FieldOfView::new(self.imaging.mosaic_fov_width, self.imaging.mosaic_fov_height)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::minutes(self.visibility.sample_interval_minutes as i64)
    }

    pub fn min_visibility(&self) -> Duration {
        hours_to_duration(self.visibility.min_visibility_hours.value())
    }

    pub fn min_mosaic_overlap(&self) -> Duration {
        self.mosaic
            .min_overlap_hours
            .map(|h| hours_to_duration(h.value()))
            .unwrap_or_else(|| self.min_visibility())
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(PlannerError::InvalidConfig(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml = r#"
[observer]
latitude = 28.76
longitude = -17.89
"#;

        let config = PlannerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.observer.latitude.value(), 28.76);
        assert_eq!(config.visibility.min_altitude.value(), 30.0);
        assert_eq!(config.imaging.bortle, 4);
        assert_eq!(config.mosaic.max_group_size, 4);
        assert_eq!(config.scheduling.strategy, SchedulingStrategy::MaxObjects);
        assert_eq!(config.scheduling.slot_step_minutes, 15);
        assert_eq!(config.moon.precision, MoonPrecision::Standard);
        assert_eq!(config, PlannerConfig::new(28.76, -17.89));
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[observer]
latitude = 40.0
longitude = -3.7

[visibility]
min_altitude = 25.0
max_altitude = 85.0
min_azimuth = 300.0
max_azimuth = 60.0
use_margins = true
min_visibility_hours = 1.5

[twilight]
precise = true

[imaging]
bortle = 6
fov_width = 0.9
fov_height = 0.6
single_exposure = 120.0

[moon]
precision = "high"
min_interference_minutes = 20.0

[mosaic]
enabled = false
max_group_size = 3
min_overlap_hours = 1.0

[scheduling]
strategy = "optimal_snr"
max_overlap_minutes = 0.0
exclude_insufficient_time = false
"#;

        let config = PlannerConfig::from_toml_str(toml).unwrap();
        assert!(config.visibility.use_margins);
        assert_eq!(config.visibility.min_azimuth.value(), 300.0);
        assert_eq!(config.dark_sun_altitude(), -12.0);
        assert_eq!(config.moon.precision, MoonPrecision::High);
        assert!(!config.mosaic.enabled);
        assert_eq!(config.min_mosaic_overlap(), Duration::hours(1));
        assert_eq!(config.scheduling.strategy, SchedulingStrategy::OptimalSnr);
        assert!(!config.scheduling.exclude_insufficient_time);
        assert_eq!(config.instrument_fov(), FieldOfView::from_degrees(0.9, 0.6));
    }

    #[test]
    fn test_missing_observer_section_fails() {
        let err = PlannerConfig::from_toml_str("[imaging]\nbortle = 3\n").unwrap_err();
        assert!(matches!(err, PlannerError::TomlParse(_)));
    }

    #[test]
    fn test_validation_rejects_impossible_values() {
        let mut config = PlannerConfig::new(95.0, 0.0);
        assert!(config.validate().is_err());

        config = PlannerConfig::new(40.0, 0.0);
        config.visibility.min_altitude = qtty::Degrees::new(60.0);
        config.visibility.max_altitude = qtty::Degrees::new(30.0);
        assert!(config.validate().is_err());

        config = PlannerConfig::new(40.0, 0.0);
        config.imaging.bortle = 10;
        assert!(config.validate().is_err());

        config = PlannerConfig::new(40.0, 0.0);
        config.imaging.fov_width = qtty::Degrees::new(0.0);
        assert!(config.validate().is_err());

        config = PlannerConfig::new(40.0, 0.0);
        config.visibility.sample_interval_minutes = 0;
        assert!(config.validate().is_err());

        config = PlannerConfig::new(40.0, 0.0);
        config.mosaic.max_group_size = 1;
        assert!(matches!(config.validate(), Err(PlannerError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_strategy_is_a_parse_error() {
        let toml = r#"
[observer]
latitude = 40.0
longitude = 0.0

[scheduling]
strategy = "fastest"
"#;
        assert!(PlannerConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[observer]\nlatitude = -30.24\nlongitude = -70.74").unwrap();

        let config = PlannerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.observer.latitude.value(), -30.24);
        assert_eq!(config.min_visibility(), Duration::hours(2));
    }

    #[test]
    fn test_from_missing_file() {
        let err = PlannerConfig::from_file("/nonexistent/nightplan.toml").unwrap_err();
        assert!(matches!(err, PlannerError::Io(_)));
    }
}
