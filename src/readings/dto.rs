use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{GlucoseReading, MeasurementType};
use crate::notices::Notice;

#[derive(Debug, Deserialize)]
pub struct CreateReadingRequest {
    pub glucose_level: i32,
    pub measurement_type: MeasurementType,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedReadingResponse {
    pub reading: GlucoseReading,
    pub notices: Vec<Notice>,
}
