use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;

use super::{summarize_week, week_start, WeekSummary, RECENT_ITEMS};
use crate::{
    auth::AuthUser,
    errors::internal,
    meals::{self, repo_types::Meal},
    profile,
    readings::{self, repo_types::GlucoseReading},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub recent_readings: Vec<GlucoseReading>,
    pub recent_meals: Vec<Meal>,
    pub week: WeekSummary,
    pub target_glucose_min: i32,
    pub target_glucose_max: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardResponse>, (StatusCode, String)> {
    let recent_readings = readings::repo::list_by_user(&state.db, user_id, RECENT_ITEMS, 0)
        .await
        .map_err(internal)?;
    let recent_meals = meals::repo::list_by_user(&state.db, user_id, RECENT_ITEMS, 0)
        .await
        .map_err(internal)?;

    let since = week_start(OffsetDateTime::now_utc());
    let week = readings::repo::list_since(&state.db, user_id, since)
        .await
        .map_err(internal)?;
    let profile = profile::repo::get_or_default(&state.db, user_id)
        .await
        .map_err(internal)?;

    Ok(Json(DashboardResponse {
        recent_readings,
        recent_meals,
        week: summarize_week(&week),
        target_glucose_min: profile.target_glucose_min,
        target_glucose_max: profile.target_glucose_max,
    }))
}
