use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    errors::internal,
    state::AppState,
};

use super::{
    dto::{SetLanguageRequest, UpdateProfileRequest},
    repo,
    repo_types::UserProfile,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/language", put(set_language))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let profile = repo::get_or_default(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(profile))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    UserProfile::check_target_range(body.target_glucose_min, body.target_glucose_max)?;

    let profile = UserProfile {
        user_id,
        diagnosis_date: body.diagnosis_date,
        target_glucose_min: body.target_glucose_min,
        target_glucose_max: body.target_glucose_max,
        language_preference: body.language_preference,
    };
    repo::upsert(&state.db, &profile).await.map_err(internal)?;

    info!(%user_id, "profile updated");
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn set_language(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SetLanguageRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    repo::set_language(&state.db, user_id, body.language)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}
