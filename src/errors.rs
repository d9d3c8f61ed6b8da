use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

pub const GLUCOSE_MIN_MG_DL: i32 = 20;
pub const GLUCOSE_MAX_MG_DL: i32 = 600;

/// Input rejected before anything is persisted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Glucose level must be between {GLUCOSE_MIN_MG_DL} and {GLUCOSE_MAX_MG_DL} mg/dL.")]
    GlucoseOutOfRange(i32),

    #[error("Target minimum ({min}) must be lower than target maximum ({max}).")]
    TargetRange { min: i32, max: i32 },

    #[error("Unknown measurement type: {0}")]
    UnknownMeasurementType(String),

    #[error("Unknown meal type: {0}")]
    UnknownMealType(String),

    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("{0} is required")]
    MissingField(&'static str),
}

impl From<ValidationError> for (StatusCode, String) {
    fn from(e: ValidationError) -> Self {
        (StatusCode::BAD_REQUEST, e.to_string())
    }
}

pub fn check_glucose_level(level: i32) -> Result<i32, ValidationError> {
    if (GLUCOSE_MIN_MG_DL..=GLUCOSE_MAX_MG_DL).contains(&level) {
        Ok(level)
    } else {
        Err(ValidationError::GlucoseOutOfRange(level))
    }
}

/// Logs and hides the cause behind a 500.
pub fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}
