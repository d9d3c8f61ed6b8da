use serde::Serialize;

use super::repo_types::Meal;
use crate::notices::Notice;

#[derive(Debug, Serialize)]
pub struct CreatedMealResponse {
    pub meal: Meal,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    #[serde(flatten)]
    pub meal: Meal,
    pub display_description: String,
    pub photo_url: Option<String>,
}
