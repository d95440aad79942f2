use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Geographic position of the observer.
///
/// Angles are kept in radians; the planner builds one observer from the
/// configuration and never changes it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    /// Geodetic latitude in radians (north positive)
    pub latitude: f64,
    /// Longitude in radians (east positive)
    pub longitude: f64,
}

impl Observer {
    pub fn from_degrees(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PlannerError::InvalidConfig(
                "Latitude must be between -90 and 90 degrees".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PlannerError::InvalidConfig(
                "Longitude must be between -180 and 180 degrees".to_string(),
            ));
        }
        Ok(Self {
            latitude: latitude.to_radians(),
            longitude: longitude.to_radians(),
        })
    }

    pub fn latitude_degrees(&self) -> f64 {
        self.latitude.to_degrees()
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_degrees() {
        let obs = Observer::from_degrees(28.7624, -17.8892).unwrap();
        assert!((obs.latitude_degrees() - 28.7624).abs() < 1e-9);
        assert!((obs.longitude_degrees() + 17.8892).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Observer::from_degrees(91.0, 0.0).is_err());
        assert!(Observer::from_degrees(0.0, -181.0).is_err());
    }
}
