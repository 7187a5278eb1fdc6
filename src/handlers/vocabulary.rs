use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::CONFIG;
use crate::db::models::DbVocable;
use crate::error::PivotError;
use crate::handlers::{PageQuery, Paginated};
use crate::middleware::CurrentUser;
use crate::router::PivotState;
use crate::service::vocabulary;

#[derive(Debug, Deserialize)]
pub struct VocableRequest {
    /// `{iso: text}`; unknown codes are rejected.
    pub translations: BTreeMap<String, String>,
}

/// GET /vocabulary?page=
pub async fn list(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<DbVocable>>, PivotError> {
    let page = query.page.max(1);
    let per_page = CONFIG.vocables_per_page;
    let (items, total) = vocabulary::page(&state.storage, user.id, page, per_page).await?;
    Ok(Json(Paginated::new(items, page, per_page, total)))
}

/// POST /vocabulary
pub async fn create(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<VocableRequest>,
) -> Result<impl IntoResponse, PivotError> {
    let vocable = vocabulary::create(&state.storage, user.id, &req.translations).await?;
    info!(user_id = user.id, vocable_id = vocable.id, "vocable added");
    Ok((StatusCode::CREATED, Json(vocable)))
}

/// GET /vocabulary/{id}
pub async fn get_one(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<DbVocable>, PivotError> {
    Ok(Json(
        vocabulary::fetch_owned(&state.storage, user.id, id).await?,
    ))
}

/// PUT /vocabulary/{id}
pub async fn update(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<VocableRequest>,
) -> Result<Json<DbVocable>, PivotError> {
    Ok(Json(
        vocabulary::update(&state.storage, user.id, id, &req.translations).await?,
    ))
}

/// DELETE /vocabulary/{id} -> cascades the vocable's practice records.
pub async fn delete(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, PivotError> {
    vocabulary::remove(&state.storage, user.id, id).await?;
    info!(user_id = user.id, vocable_id = id, "vocable deleted");
    Ok(StatusCode::NO_CONTENT)
}
