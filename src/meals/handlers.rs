use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreatedMealResponse, MealDetails},
    repo,
    repo_types::{Meal, MealType},
    services::{ingest_meal, IngestOutcome, NewMealForm},
};
use crate::{
    auth::AuthUser,
    errors::{internal, ValidationError},
    pagination::{Page, PageQuery},
    state::AppState,
    timefmt::parse_timestamp,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const PHOTO_URL_TTL_SECS: u64 = 600;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

async fn text(field: Field<'_>) -> Result<String, (StatusCode, String)> {
    field
        .text()
        .await
        .map_err(|e| bad_request(format!("invalid multipart field: {e}")))
}

/// Reads `photo`, `meal_type`, `timestamp` and `manual_notes`; other fields are ignored.
async fn read_form(mut mp: Multipart) -> Result<NewMealForm, (StatusCode, String)> {
    let mut photo: Option<(Bytes, String)> = None;
    let mut meal_type: Option<MealType> = None;
    let mut timestamp = None;
    let mut manual_notes = String::new();

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("photo") => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("photo upload failed: {e}")))?;
                if !data.is_empty() {
                    photo = Some((data, content_type));
                }
            }
            Some("meal_type") => meal_type = Some(text(field).await?.trim().parse::<MealType>()?),
            Some("timestamp") => {
                let raw = text(field).await?;
                if !raw.trim().is_empty() {
                    timestamp = Some(parse_timestamp(&raw)?);
                }
            }
            Some("manual_notes") => manual_notes = text(field).await?,
            _ => {}
        }
    }

    let (photo, content_type) = photo.ok_or(ValidationError::MissingField("photo"))?;
    Ok(NewMealForm {
        meal_type: meal_type.ok_or(ValidationError::MissingField("meal_type"))?,
        timestamp,
        manual_notes,
        photo,
        content_type,
    })
}

/// POST /meals (multipart)
#[instrument(skip(state, mp))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, HeaderMap, Json<CreatedMealResponse>), (StatusCode, String)> {
    let form = read_form(mp).await.map_err(|e| {
        warn!(%user_id, error = %e.1, "meal submission rejected");
        e
    })?;

    let IngestOutcome { meal, notices } = ingest_meal(
        state.analyzer.as_ref(),
        state.storage.as_ref(),
        &state.db,
        user_id,
        form,
    )
    .await
    .map_err(internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::LOCATION,
        HeaderValue::from_str(&format!("/api/v1/meals/{}", meal.id)).map_err(internal)?,
    );

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedMealResponse { meal, notices }),
    ))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<Page<Meal>>, (StatusCode, String)> {
    let total = repo::count_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    let window = q.window(total);
    let items = repo::list_by_user(&state.db, user_id, window.limit, window.offset)
        .await
        .map_err(internal)?;
    Ok(Json(Page::new(items, window, total)))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, (StatusCode, String)> {
    let meal = repo::get_by_id(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Meal not found".to_string()))?;

    let photo_url = match state.storage.presign_get(&meal.photo_key, PHOTO_URL_TTL_SECS).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, meal_id = %meal.id, "presign failed");
            None
        }
    };

    Ok(Json(MealDetails {
        display_description: meal.display_description().to_string(),
        meal,
        photo_url,
    }))
}
