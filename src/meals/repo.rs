use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Meal, MealRow, NewMeal};

const COLUMNS: &str = "id, user_id, timestamp, meal_type, description, photo_key, \
                       estimated_calories, carbs_estimate, manual_notes, ai_response_raw";

/// Where the ingestion flow writes finished meals.
#[async_trait]
pub trait MealSink: Send + Sync {
    async fn insert_meal(&self, meal: NewMeal) -> anyhow::Result<Meal>;
}

#[async_trait]
impl MealSink for PgPool {
    async fn insert_meal(&self, meal: NewMeal) -> anyhow::Result<Meal> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            INSERT INTO meals (user_id, timestamp, meal_type, description, photo_key,
                               estimated_calories, carbs_estimate, manual_notes, ai_response_raw)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(meal.user_id)
        .bind(meal.timestamp)
        .bind(meal.meal_type.as_str())
        .bind(&meal.description)
        .bind(&meal.photo_key)
        .bind(meal.estimated_calories)
        .bind(meal.carbs_estimate)
        .bind(&meal.manual_notes)
        .bind(&meal.ai_response_raw)
        .fetch_one(self)
        .await
        .context("insert meal")?;
        Ok(Meal::try_from(row)?)
    }
}

fn into_meals(rows: Vec<MealRow>) -> anyhow::Result<Vec<Meal>> {
    rows.into_iter()
        .map(|r| Meal::try_from(r).map_err(anyhow::Error::from))
        .collect()
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM meals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("count meals")?;
    Ok(n)
}

/// Newest first.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM meals
         WHERE user_id = $1
         ORDER BY timestamp DESC
         LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list meals")?;
    into_meals(rows)
}

pub async fn get_by_id(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM meals
         WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(meal_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get meal")?;
    row.map(Meal::try_from).transpose().map_err(anyhow::Error::from)
}

/// Whole history, oldest first.
pub async fn list_all(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM meals
         WHERE user_id = $1
         ORDER BY timestamp ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list all meals")?;
    into_meals(rows)
}
