use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Fasting,
    PreBreakfast,
    PostBreakfast,
    PreLunch,
    PostLunch,
    PreDinner,
    PostDinner,
    Bedtime,
    Night,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 9] = [
        MeasurementType::Fasting,
        MeasurementType::PreBreakfast,
        MeasurementType::PostBreakfast,
        MeasurementType::PreLunch,
        MeasurementType::PostLunch,
        MeasurementType::PreDinner,
        MeasurementType::PostDinner,
        MeasurementType::Bedtime,
        MeasurementType::Night,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementType::Fasting => "fasting",
            MeasurementType::PreBreakfast => "pre_breakfast",
            MeasurementType::PostBreakfast => "post_breakfast",
            MeasurementType::PreLunch => "pre_lunch",
            MeasurementType::PostLunch => "post_lunch",
            MeasurementType::PreDinner => "pre_dinner",
            MeasurementType::PostDinner => "post_dinner",
            MeasurementType::Bedtime => "bedtime",
            MeasurementType::Night => "night",
        }
    }

    /// Human label used in exports.
    pub fn label(self) -> &'static str {
        match self {
            MeasurementType::Fasting => "Fasting",
            MeasurementType::PreBreakfast => "Pre Breakfast",
            MeasurementType::PostBreakfast => "Post Breakfast",
            MeasurementType::PreLunch => "Pre Lunch",
            MeasurementType::PostLunch => "Post Lunch",
            MeasurementType::PreDinner => "Pre Dinner",
            MeasurementType::PostDinner => "Post Dinner",
            MeasurementType::Bedtime => "Bedtime",
            MeasurementType::Night => "Night",
        }
    }
}

impl FromStr for MeasurementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownMeasurementType(s.to_string()))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct GlucoseReadingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timestamp: OffsetDateTime,
    pub glucose_level: i32,
    pub measurement_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GlucoseReading {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub glucose_level: i32,
    pub measurement_type: MeasurementType,
    pub notes: Option<String>,
}

impl TryFrom<GlucoseReadingRow> for GlucoseReading {
    type Error = ValidationError;

    fn try_from(r: GlucoseReadingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            timestamp: r.timestamp,
            glucose_level: r.glucose_level,
            measurement_type: r.measurement_type.parse()?,
            notes: r.notes,
        })
    }
}

/// A validated reading that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub user_id: Uuid,
    pub timestamp: OffsetDateTime,
    pub glucose_level: i32,
    pub measurement_type: MeasurementType,
    pub notes: Option<String>,
}
