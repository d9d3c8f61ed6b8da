use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};

use super::{
    dto::{ScheduleResponse, UpdateScheduleRequest},
    grid::ScheduleGrid,
    repo,
};
use crate::{auth::AuthUser, errors::internal, notices::Notice, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/schedule", get(get_schedule).put(put_schedule))
}

#[instrument(skip(state))]
pub async fn get_schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ScheduleResponse>, (StatusCode, String)> {
    let grid = repo::get(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(ScheduleResponse {
        schedule: grid.to_map(),
        notices: Vec::new(),
    }))
}

/// Replaces the whole grid; cells left out of the body are switched off.
#[instrument(skip(state, body))]
pub async fn put_schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, (StatusCode, String)> {
    let grid = ScheduleGrid::from_map(&body.schedule);
    repo::upsert(&state.db, user_id, &grid)
        .await
        .map_err(internal)?;
    info!(%user_id, enabled = grid.enabled_count(), "schedule updated");

    Ok(Json(ScheduleResponse {
        schedule: grid.to_map(),
        notices: vec![Notice::success("Measurement schedule updated successfully.")],
    }))
}
