//! Meal photo analysis through an external multimodal model.
//!
//! The rest of the service only sees [`MealAnalyzer`]; the concrete client
//! talks to an OpenAI-compatible chat-completions endpoint.

mod openai;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use openai::OpenAiVisionClient;

pub const ANALYSIS_PROMPT: &str = "Analyze this food photo and provide:\n\
1. Detailed description of the meal\n\
2. Estimated total calories (kcal)\n\
3. Estimated carbohydrates (grams)\n\
4. Main components list\n\
Format as JSON: {description, calories, carbs, components[]}";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("vision API key not configured")]
    NotConfigured,

    #[error("API error: {0}")]
    Transport(String),

    #[error("failed to parse AI response")]
    Parse(#[source] serde_json::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Nutrition estimate as returned by the model.
///
/// `calories` and `carbs` are kept as raw JSON: models answer with numbers,
/// numeric strings, `null` or things like `"12g"`. Turning them into numbers
/// is the caller's job.
#[derive(Debug, Clone, PartialEq)]
pub struct MealAnalysis {
    pub description: String,
    pub calories: Value,
    pub carbs: Value,
    pub components: Vec<String>,
    pub raw: Value,
}

impl MealAnalysis {
    pub fn from_object(obj: Map<String, Value>) -> Self {
        let description = match obj.get("description") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        let components = match obj.get("components") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            description,
            calories: obj.get("calories").cloned().unwrap_or(Value::Null),
            carbs: obj.get("carbs").cloned().unwrap_or(Value::Null),
            components,
            raw: Value::Object(obj),
        }
    }

    /// Parses the model's message payload, which must be a single JSON object.
    /// An object carrying an `error` key is the model declining to analyse.
    pub fn from_content(content: &str) -> Result<Self, AnalysisError> {
        match serde_json::from_str::<Value>(content).map_err(AnalysisError::Parse)? {
            Value::Object(obj) => match obj.get("error") {
                Some(Value::String(msg)) => Err(AnalysisError::Unexpected(msg.clone())),
                Some(other) => Err(AnalysisError::Unexpected(other.to_string())),
                None => Ok(Self::from_object(obj)),
            },
            other => Err(AnalysisError::Unexpected(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
pub trait MealAnalyzer: Send + Sync {
    /// One attempt, no retries.
    async fn analyze(&self, image: &[u8]) -> Result<MealAnalysis, AnalysisError>;
}
