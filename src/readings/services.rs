use time::OffsetDateTime;
use uuid::Uuid;

use super::{dto::CreateReadingRequest, repo_types::NewReading};
use crate::errors::{check_glucose_level, ValidationError};

/// Applies the domain checks; blank notes are dropped.
pub fn validate_new_reading(
    user_id: Uuid,
    req: CreateReadingRequest,
    now: OffsetDateTime,
) -> Result<NewReading, ValidationError> {
    let glucose_level = check_glucose_level(req.glucose_level)?;
    Ok(NewReading {
        user_id,
        timestamp: req.timestamp.unwrap_or(now),
        glucose_level,
        measurement_type: req.measurement_type,
        notes: req
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}
