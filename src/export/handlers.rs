use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::{export, report, Artifact, ExportFormat, ExportQuery};
use crate::{auth::AuthUser, errors::internal, meals, readings, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/export", get(export_data))
        .route("/report", get(generate_report))
}

fn attachment(artifact: Artifact) -> Result<(HeaderMap, Vec<u8>), (StatusCode, String)> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", artifact.filename))
            .map_err(internal)?,
    );
    Ok((headers, artifact.bytes))
}

#[instrument(skip(state))]
pub async fn export_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ExportQuery>,
) -> Result<(HeaderMap, Vec<u8>), (StatusCode, String)> {
    let format = ExportFormat::from_query(q.format.as_deref());
    let readings = readings::repo::list_all(&state.db, user_id)
        .await
        .map_err(internal)?;
    let meals = meals::repo::list_all(&state.db, user_id)
        .await
        .map_err(internal)?;

    let artifact = export(format, &readings, &meals).map_err(internal)?;
    info!(%user_id, ?format, bytes = artifact.bytes.len(), "export generated");
    attachment(artifact)
}

#[instrument(skip(state))]
pub async fn generate_report(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, Vec<u8>), (StatusCode, String)> {
    let readings = readings::repo::list_all(&state.db, user_id)
        .await
        .map_err(internal)?;
    let meals = meals::repo::list_all(&state.db, user_id)
        .await
        .map_err(internal)?;

    let artifact = report(&readings, &meals, OffsetDateTime::now_utc());
    info!(%user_id, bytes = artifact.bytes.len(), "report generated");
    attachment(artifact)
}
