use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    It,
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "it" => Ok(Language::It),
            "en" => Ok(Language::En),
            other => Err(ValidationError::UnknownLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserProfileRow {
    pub user_id: Uuid,
    pub diagnosis_date: Option<Date>,
    pub target_glucose_min: i32,
    pub target_glucose_max: i32,
    pub language_preference: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: Uuid,
    #[serde(with = "crate::timefmt::iso_date::option")]
    pub diagnosis_date: Option<Date>,
    pub target_glucose_min: i32,
    pub target_glucose_max: i32,
    pub language_preference: Language,
}

impl UserProfile {
    pub const DEFAULT_TARGET_MIN: i32 = 70;
    pub const DEFAULT_TARGET_MAX: i32 = 180;

    pub fn default_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            diagnosis_date: None,
            target_glucose_min: Self::DEFAULT_TARGET_MIN,
            target_glucose_max: Self::DEFAULT_TARGET_MAX,
            language_preference: Language::default(),
        }
    }

    pub fn check_target_range(min: i32, max: i32) -> Result<(), ValidationError> {
        if min < max {
            Ok(())
        } else {
            Err(ValidationError::TargetRange { min, max })
        }
    }
}

impl TryFrom<UserProfileRow> for UserProfile {
    type Error = ValidationError;

    fn try_from(r: UserProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: r.user_id,
            diagnosis_date: r.diagnosis_date,
            target_glucose_min: r.target_glucose_min,
            target_glucose_max: r.target_glucose_max,
            language_preference: r.language_preference.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_account() {
        let p = UserProfile::default_for(Uuid::nil());
        assert_eq!(p.target_glucose_min, 70);
        assert_eq!(p.target_glucose_max, 180);
        assert_eq!(p.language_preference, Language::It);
    }

    #[test]
    fn language_is_a_closed_set() {
        assert_eq!("en".parse::<Language>(), Ok(Language::En));
        assert_eq!(
            "fr".parse::<Language>(),
            Err(ValidationError::UnknownLanguage("fr".into()))
        );
    }

    #[test]
    fn target_range_must_be_increasing() {
        assert!(UserProfile::check_target_range(70, 180).is_ok());
        assert_eq!(
            UserProfile::check_target_range(180, 180),
            Err(ValidationError::TargetRange { min: 180, max: 180 })
        );
    }
}
