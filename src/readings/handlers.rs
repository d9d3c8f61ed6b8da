use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthUser,
    errors::internal,
    notices::Notice,
    pagination::{Page, PageQuery},
    state::AppState,
};

use super::{
    dto::{CreateReadingRequest, CreatedReadingResponse},
    repo,
    repo_types::GlucoseReading,
    services::validate_new_reading,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/readings", get(list_readings).post(create_reading))
}

#[instrument(skip(state, body))]
pub async fn create_reading(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateReadingRequest>,
) -> Result<(StatusCode, Json<CreatedReadingResponse>), (StatusCode, String)> {
    let new = validate_new_reading(user_id, body, OffsetDateTime::now_utc()).map_err(|e| {
        warn!(%user_id, error = %e, "reading rejected");
        e
    })?;

    let reading = repo::insert(&state.db, &new).await.map_err(internal)?;
    info!(%user_id, reading_id = %reading.id, level = reading.glucose_level, "reading added");

    Ok((
        StatusCode::CREATED,
        Json(CreatedReadingResponse {
            reading,
            notices: vec![Notice::success("Glucose reading added successfully.")],
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_readings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<Page<GlucoseReading>>, (StatusCode, String)> {
    let total = repo::count_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    let window = q.window(total);
    let items = repo::list_by_user(&state.db, user_id, window.limit, window.offset)
        .await
        .map_err(internal)?;
    Ok(Json(Page::new(items, window, total)))
}
