use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl FromStr for MealType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(ValidationError::UnknownMealType(other.to_string())),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timestamp: OffsetDateTime,
    pub meal_type: String,
    pub description: String,
    pub photo_key: String,
    pub estimated_calories: Option<i32>,
    pub carbs_estimate: Option<f64>,
    pub manual_notes: String,
    pub ai_response_raw: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Meal {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub meal_type: MealType,
    pub description: String,
    pub photo_key: String,
    pub estimated_calories: Option<i32>,
    pub carbs_estimate: Option<f64>,
    pub manual_notes: String,
    pub ai_response_raw: Option<serde_json::Value>,
}

impl Meal {
    /// AI description, or the user's own notes when there is none.
    pub fn display_description(&self) -> &str {
        if self.description.is_empty() {
            &self.manual_notes
        } else {
            &self.description
        }
    }
}

impl TryFrom<MealRow> for Meal {
    type Error = ValidationError;

    fn try_from(r: MealRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            timestamp: r.timestamp,
            meal_type: r.meal_type.parse()?,
            description: r.description,
            photo_key: r.photo_key,
            estimated_calories: r.estimated_calories,
            carbs_estimate: r.carbs_estimate,
            manual_notes: r.manual_notes,
            ai_response_raw: r.ai_response_raw,
        })
    }
}

/// Meal assembled by the ingestion flow, not stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
    pub user_id: Uuid,
    pub timestamp: OffsetDateTime,
    pub meal_type: MealType,
    pub photo_key: String,
    pub description: String,
    pub estimated_calories: Option<i32>,
    pub carbs_estimate: Option<f64>,
    pub manual_notes: String,
    pub ai_response_raw: Option<serde_json::Value>,
}

#[cfg(test)]
impl NewMeal {
    pub fn into_meal(self, id: Uuid) -> Meal {
        Meal {
            id,
            user_id: self.user_id,
            timestamp: self.timestamp,
            meal_type: self.meal_type,
            description: self.description,
            photo_key: self.photo_key,
            estimated_calories: self.estimated_calories,
            carbs_estimate: self.carbs_estimate,
            manual_notes: self.manual_notes,
            ai_response_raw: self.ai_response_raw,
        }
    }
}
