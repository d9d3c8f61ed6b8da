use serde::Deserialize;
use time::Date;

use super::repo_types::Language;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub target_glucose_min: i32,
    pub target_glucose_max: i32,
    pub language_preference: Language,
    #[serde(default, with = "crate::timefmt::iso_date::option")]
    pub diagnosis_date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    pub language: Language,
}
