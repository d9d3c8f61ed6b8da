use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{GlucoseReading, GlucoseReadingRow, NewReading};

const COLUMNS: &str = "id, user_id, timestamp, glucose_level, measurement_type, notes";

fn into_readings(rows: Vec<GlucoseReadingRow>) -> anyhow::Result<Vec<GlucoseReading>> {
    rows.into_iter()
        .map(|r| GlucoseReading::try_from(r).map_err(anyhow::Error::from))
        .collect()
}

pub async fn insert(db: &PgPool, new: &NewReading) -> anyhow::Result<GlucoseReading> {
    let row = sqlx::query_as::<_, GlucoseReadingRow>(&format!(
        r#"
        INSERT INTO glucose_readings (user_id, timestamp, glucose_level, measurement_type, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(new.user_id)
    .bind(new.timestamp)
    .bind(new.glucose_level)
    .bind(new.measurement_type.as_str())
    .bind(new.notes.as_deref())
    .fetch_one(db)
    .await
    .context("insert glucose reading")?;
    Ok(GlucoseReading::try_from(row)?)
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM glucose_readings WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("count glucose readings")?;
    Ok(n)
}

/// Newest first.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<GlucoseReading>> {
    let rows = sqlx::query_as::<_, GlucoseReadingRow>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM glucose_readings
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
    .context("list glucose readings")?;
    into_readings(rows)
}

/// Oldest first, from `since` onwards.
pub async fn list_since(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<GlucoseReading>> {
    let rows = sqlx::query_as::<_, GlucoseReadingRow>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM glucose_readings
         WHERE user_id = $1 AND timestamp >= $2
         ORDER BY timestamp ASC
        "#
    ))
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await
    .context("list recent glucose readings")?;
    into_readings(rows)
}

/// Whole history, oldest first.
pub async fn list_all(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<GlucoseReading>> {
    let rows = sqlx::query_as::<_, GlucoseReadingRow>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM glucose_readings
         WHERE user_id = $1
         ORDER BY timestamp ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list all glucose readings")?;
    into_readings(rows)
}
