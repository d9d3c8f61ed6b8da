use anyhow::Context;
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    repo::MealSink,
    repo_types::{Meal, MealType, NewMeal},
};
use crate::{
    images::{photo_key, prepare_for_analysis, PreparedImage},
    notices::Notice,
    storage::StorageClient,
    vision::{AnalysisError, MealAnalyzer},
};

/// Fields of a meal submission after multipart parsing.
#[derive(Debug, Clone)]
pub struct NewMealForm {
    pub meal_type: MealType,
    pub timestamp: Option<OffsetDateTime>,
    pub manual_notes: String,
    pub photo: Bytes,
    pub content_type: String,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub meal: Meal,
    pub notices: Vec<Notice>,
}

/// Integer calories from whatever the model returned.
pub fn coerce_int(v: &Value) -> Option<i32> {
    let out = match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .and_then(|n| i32::try_from(n).ok());
    if out.is_none() && !v.is_null() {
        debug!(value = %v, "calories not coercible to an integer");
    }
    out
}

/// Carbohydrate grams from whatever the model returned.
pub fn coerce_float(v: &Value) -> Option<f64> {
    let out = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite());
    if out.is_none() && !v.is_null() {
        debug!(value = %v, "carbs not coercible to a number");
    }
    out
}

fn failure_notice(err: &AnalysisError) -> Notice {
    Notice::warning(format!("AI analysis failed: {err}"))
}

/// Stores the photo, asks the analyzer about it and saves one meal row.
///
/// Analysis problems end up as notices; only storage or database failures
/// abort the submission.
pub async fn ingest_meal(
    analyzer: &dyn MealAnalyzer,
    photos: &dyn StorageClient,
    sink: &dyn MealSink,
    user_id: Uuid,
    form: NewMealForm,
) -> anyhow::Result<IngestOutcome> {
    ingest_with(prepare_for_analysis, analyzer, photos, sink, user_id, form).await
}

async fn ingest_with(
    prepare: fn(Bytes) -> PreparedImage,
    analyzer: &dyn MealAnalyzer,
    photos: &dyn StorageClient,
    sink: &dyn MealSink,
    user_id: Uuid,
    form: NewMealForm,
) -> anyhow::Result<IngestOutcome> {
    let timestamp = form.timestamp.unwrap_or_else(OffsetDateTime::now_utc);
    let key = photo_key(timestamp, &form.content_type);

    photos
        .put_object(&key, form.photo.clone(), &form.content_type)
        .await
        .context("store meal photo")?;

    let mut pending = NewMeal {
        user_id,
        timestamp,
        meal_type: form.meal_type,
        photo_key: key,
        description: String::new(),
        estimated_calories: None,
        carbs_estimate: None,
        manual_notes: form.manual_notes.trim().to_string(),
        ai_response_raw: None,
    };
    let mut notices = Vec::with_capacity(2);

    let photo = form.photo;
    match tokio::task::spawn_blocking(move || prepare(photo)).await {
        Ok(prepared) => match analyzer.analyze(prepared.bytes()).await {
            Ok(analysis) => {
                pending.estimated_calories = coerce_int(&analysis.calories);
                pending.carbs_estimate = coerce_float(&analysis.carbs);
                pending.description = analysis.description;
                pending.ai_response_raw = Some(analysis.raw);
                notices.push(Notice::info("AI analysis complete. Please review the details."));
            }
            Err(e) => {
                warn!(%user_id, error = %e, fallback = prepared.is_fallback(), "meal analysis failed");
                notices.push(failure_notice(&e));
            }
        },
        // A panic here is outside the analyzer's own error handling.
        Err(e) => {
            error!(%user_id, error = %e, "photo preparation crashed; skipping analysis");
            notices.push(Notice::error(format!("Error during AI analysis: {e}")));
        }
    }

    let meal = sink.insert_meal(pending).await?;
    info!(%user_id, meal_id = %meal.id, analyzed = meal.ai_response_raw.is_some(), "meal added");
    notices.push(Notice::success("Meal added successfully."));

    Ok(IngestOutcome { meal, notices })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use serde_json::json;
    use time::macros::datetime;

    use super::*;
    use crate::notices::NoticeLevel;
    use crate::storage::fake::FakeStorage;
    use crate::vision::MealAnalysis;

    struct CannedAnalyzer {
        reply: fn() -> Result<MealAnalysis, AnalysisError>,
        calls: AtomicUsize,
    }

    impl CannedAnalyzer {
        fn new(reply: fn() -> Result<MealAnalysis, AnalysisError>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MealAnalyzer for CannedAnalyzer {
        async fn analyze(&self, _image: &[u8]) -> Result<MealAnalysis, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Mutex<Vec<Meal>>,
    }

    #[async_trait]
    impl MealSink for MemorySink {
        async fn insert_meal(&self, meal: NewMeal) -> anyhow::Result<Meal> {
            let meal = meal.into_meal(Uuid::new_v4());
            self.rows.lock().expect("sink lock").push(meal.clone());
            Ok(meal)
        }
    }

    fn analysis(v: Value) -> MealAnalysis {
        match v {
            Value::Object(obj) => MealAnalysis::from_object(obj),
            _ => unreachable!("test analysis must be an object"),
        }
    }

    fn png() -> Bytes {
        let img = RgbImage::from_pixel(64, 48, image::Rgb([200, 120, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
        Bytes::from(buf.into_inner())
    }

    fn form(notes: &str) -> NewMealForm {
        NewMealForm {
            meal_type: MealType::Lunch,
            timestamp: Some(datetime!(2024-03-05 12:30 UTC)),
            manual_notes: notes.into(),
            photo: png(),
            content_type: "image/png".into(),
        }
    }

    async fn run(
        reply: fn() -> Result<MealAnalysis, AnalysisError>,
        notes: &str,
    ) -> (IngestOutcome, MemorySink, FakeStorage, usize) {
        let analyzer = CannedAnalyzer::new(reply);
        let storage = FakeStorage::default();
        let sink = MemorySink::default();
        let out = ingest_meal(&analyzer, &storage, &sink, Uuid::new_v4(), form(notes))
            .await
            .expect("ingest");
        let calls = analyzer.calls.load(Ordering::SeqCst);
        (out, sink, storage, calls)
    }

    fn levels(notices: &[Notice]) -> Vec<NoticeLevel> {
        notices.iter().map(|n| n.level).collect()
    }

    #[test]
    fn coerce_int_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_int(&json!(450)), Some(450));
        assert_eq!(coerce_int(&json!(450.0)), Some(450));
        assert_eq!(coerce_int(&json!(" 450 ")), Some(450));
        assert_eq!(coerce_int(&json!(450.5)), None);
        assert_eq!(coerce_int(&json!("12g")), None);
        assert_eq!(coerce_int(&json!(null)), None);
        assert_eq!(coerce_int(&json!(true)), None);
        assert_eq!(coerce_int(&json!([450])), None);
        assert_eq!(coerce_int(&json!(1e12)), None);
    }

    #[test]
    fn coerce_float_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_float(&json!(60)), Some(60.0));
        assert_eq!(coerce_float(&json!("60")), Some(60.0));
        assert_eq!(coerce_float(&json!("12.5")), Some(12.5));
        assert_eq!(coerce_float(&json!("12g")), None);
        assert_eq!(coerce_float(&json!("NaN")), None);
        assert_eq!(coerce_float(&json!(null)), None);
        assert_eq!(coerce_float(&json!({"g": 1})), None);
    }

    #[tokio::test]
    async fn pasta_with_string_numbers_is_stored_coerced() {
        let (out, sink, storage, calls) = run(
            || {
                Ok(analysis(json!({
                    "description": "Pasta",
                    "calories": "450",
                    "carbs": "60",
                    "components": ["pasta", "tomato"]
                })))
            },
            "",
        )
        .await;

        assert_eq!(calls, 1);
        assert_eq!(out.meal.description, "Pasta");
        assert_eq!(out.meal.estimated_calories, Some(450));
        assert_eq!(out.meal.carbs_estimate, Some(60.0));
        assert_eq!(out.meal.ai_response_raw.as_ref().map(|r| &r["calories"]), Some(&json!("450")));
        assert_eq!(levels(&out.notices), vec![NoticeLevel::Info, NoticeLevel::Success]);
        assert_eq!(out.notices[1].message, "Meal added successfully.");

        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
        let puts = storage.puts.lock().expect("lock");
        assert_eq!(puts.len(), 1);
        assert!(puts[0].0.starts_with("meals/2024/03/05/"), "{}", puts[0].0);
        assert!(puts[0].0.ends_with(".png"));
        assert_eq!(out.meal.photo_key, puts[0].0);
    }

    #[tokio::test]
    async fn unparseable_numbers_are_left_unset() {
        let (out, sink, _, _) = run(
            || {
                Ok(analysis(json!({
                    "description": "Salad",
                    "calories": null,
                    "carbs": "12g"
                })))
            },
            "",
        )
        .await;

        assert_eq!(out.meal.description, "Salad");
        assert_eq!(out.meal.estimated_calories, None);
        assert_eq!(out.meal.carbs_estimate, None);
        assert!(out.meal.ai_response_raw.is_some());
        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn missing_api_key_still_saves_the_meal() {
        let (out, sink, _, calls) = run(|| Err(AnalysisError::NotConfigured), "homemade").await;

        assert_eq!(calls, 1);
        assert_eq!(levels(&out.notices), vec![NoticeLevel::Warning, NoticeLevel::Success]);
        assert!(out.notices[0].message.starts_with("AI analysis failed:"));
        assert_eq!(out.meal.description, "");
        assert_eq!(out.meal.manual_notes, "homemade");
        assert_eq!(out.meal.display_description(), "homemade");
        assert_eq!(out.meal.ai_response_raw, None);
        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn transport_and_parse_failures_are_warnings() {
        let (out, _, _, _) = run(|| Err(AnalysisError::Transport("429 Too Many Requests".into())), "").await;
        assert_eq!(out.notices[0].level, NoticeLevel::Warning);
        assert!(out.notices[0].message.contains("429"));

        let (out, sink, _, _) = run(
            || Err(MealAnalysis::from_content("not json").expect_err("parse error")),
            "",
        )
        .await;
        assert_eq!(out.notices[0].level, NoticeLevel::Warning);
        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn unexpected_failure_is_a_warning_too() {
        let (out, sink, _, _) = run(|| Err(AnalysisError::Unexpected("no choices".into())), "").await;
        assert_eq!(levels(&out.notices), vec![NoticeLevel::Warning, NoticeLevel::Success]);
        assert!(out.notices[0].message.starts_with("AI analysis failed:"));
        assert!(out.notices[0].message.contains("no choices"));
        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn model_error_reply_leaves_ai_fields_unset() {
        let (out, sink, _, calls) = run(
            || MealAnalysis::from_content(r#"{"error":"No food detected"}"#),
            "just coffee",
        )
        .await;

        assert_eq!(calls, 1);
        assert_eq!(levels(&out.notices), vec![NoticeLevel::Warning, NoticeLevel::Success]);
        assert!(out.notices[0].message.contains("No food detected"));
        assert_eq!(out.meal.description, "");
        assert_eq!(out.meal.estimated_calories, None);
        assert_eq!(out.meal.ai_response_raw, None);
        assert_eq!(out.meal.display_description(), "just coffee");
        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn crashed_preparation_is_an_error_notice_and_still_saves() {
        fn explode(_raw: Bytes) -> PreparedImage {
            panic!("decoder bug")
        }

        let analyzer = CannedAnalyzer::new(|| Ok(analysis(json!({"description": "Soup"}))));
        let storage = FakeStorage::default();
        let sink = MemorySink::default();
        let out = ingest_with(explode, &analyzer, &storage, &sink, Uuid::new_v4(), form(""))
            .await
            .expect("ingest");

        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(levels(&out.notices), vec![NoticeLevel::Error, NoticeLevel::Success]);
        assert!(out.notices[0].message.starts_with("Error during AI analysis:"));
        assert_eq!(out.meal.ai_response_raw, None);
        assert_eq!(sink.rows.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn undecodable_photo_is_still_analyzed_and_saved() {
        let analyzer = CannedAnalyzer::new(|| Ok(analysis(json!({"description": "Soup"}))));
        let storage = FakeStorage::default();
        let sink = MemorySink::default();
        let mut f = form("");
        f.photo = Bytes::from_static(b"definitely not an image");
        f.content_type = "image/jpeg".into();

        let out = ingest_meal(&analyzer, &storage, &sink, Uuid::new_v4(), f)
            .await
            .expect("ingest");
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.meal.description, "Soup");
        assert!(out.meal.photo_key.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn storage_failure_aborts_before_any_row() {
        struct BrokenStorage;

        #[async_trait]
        impl StorageClient for BrokenStorage {
            async fn put_object(&self, _key: &str, _body: Bytes, _ct: &str) -> anyhow::Result<()> {
                anyhow::bail!("bucket unavailable")
            }

            async fn presign_get(&self, key: &str, _seconds: u64) -> anyhow::Result<String> {
                Ok(key.to_string())
            }
        }

        let analyzer = CannedAnalyzer::new(|| Err(AnalysisError::NotConfigured));
        let sink = MemorySink::default();
        let err = ingest_meal(&analyzer, &BrokenStorage, &sink, Uuid::new_v4(), form(""))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("bucket unavailable"));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
        assert!(sink.rows.lock().expect("lock").is_empty());
    }
}
