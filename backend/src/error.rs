//! Error types for nightplan

use thiserror::Error;

/// Result type for nightplan operations
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Errors that can occur while configuring or running the planner.
///
/// Degenerate inputs that the pipeline knows how to handle (an object that is
/// never visible, a night without astronomical darkness, an empty schedule)
/// are not errors; they show up as empty results on the plan instead.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration values that cannot describe a real observing session
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Right ascension or declination that could not be parsed
    #[error("Invalid coordinate '{value}': {reason}")]
    InvalidCoordinate { value: String, reason: String },

    /// Field-of-view string that does not follow `W'xH'` or `W°xH°`
    #[error("Invalid field of view: '{0}'")]
    InvalidFieldOfView(String),

    /// I/O error (config or catalog files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlannerError {
    pub(crate) fn invalid_coordinate(value: &str, reason: impl Into<String>) -> Self {
        PlannerError::InvalidCoordinate {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
