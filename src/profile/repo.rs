use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Language, UserProfile, UserProfileRow};

pub async fn insert_default_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .context("insert default profile")?;
    Ok(())
}

/// Profile for the user, or the defaults when no row exists yet.
pub async fn get_or_default(db: &PgPool, user_id: Uuid) -> anyhow::Result<UserProfile> {
    let row = sqlx::query_as::<_, UserProfileRow>(
        r#"
        SELECT user_id, diagnosis_date, target_glucose_min, target_glucose_max, language_preference
          FROM user_profiles
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("load profile")?;

    match row {
        Some(r) => Ok(UserProfile::try_from(r)?),
        None => Ok(UserProfile::default_for(user_id)),
    }
}

pub async fn upsert(db: &PgPool, profile: &UserProfile) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles
            (user_id, diagnosis_date, target_glucose_min, target_glucose_max, language_preference)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
           SET diagnosis_date      = EXCLUDED.diagnosis_date,
               target_glucose_min  = EXCLUDED.target_glucose_min,
               target_glucose_max  = EXCLUDED.target_glucose_max,
               language_preference = EXCLUDED.language_preference
        "#,
    )
    .bind(profile.user_id)
    .bind(profile.diagnosis_date)
    .bind(profile.target_glucose_min)
    .bind(profile.target_glucose_max)
    .bind(profile.language_preference.as_str())
    .execute(db)
    .await
    .context("upsert profile")?;
    Ok(())
}

pub async fn set_language(db: &PgPool, user_id: Uuid, lang: Language) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id, language_preference)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
           SET language_preference = EXCLUDED.language_preference
        "#,
    )
    .bind(user_id)
    .bind(lang.as_str())
    .execute(db)
    .await
    .context("set language")?;
    Ok(())
}
