use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::PivotError;
use crate::middleware::CurrentUser;
use crate::router::PivotState;
use crate::service::{practice, session};

#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub language: String,
    /// `(level, vocable count)` for every level 0..=6.
    pub levels: Vec<(i64, i64)>,
}

/// POST /practice/config {source, target}
pub async fn configure(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ConfigureRequest>,
) -> Result<StatusCode, PivotError> {
    session::configure(&state.storage, user.id, &req.source, &req.target).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /practice/next -> the most-due vocable for the configured pair.
pub async fn next(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<session::DueCard>, PivotError> {
    Ok(Json(session::advance(&state.storage, user.id).await?))
}

/// POST /practice/answer -> grades the vocable in progress.
pub async fn answer(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<practice::GradeOutcome>, PivotError> {
    Ok(Json(practice::grade(&state.storage, user.id, &req.answer).await?))
}

/// POST /practice/reset -> clears the cursor.
pub async fn reset(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, PivotError> {
    session::clear(&state.storage, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /practice/stats?language= -> per-level vocable counts.
pub async fn stats(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, PivotError> {
    let language = state
        .storage
        .language_by_iso(&query.language)
        .await?
        .ok_or(PivotError::NotFound("language"))?;
    let levels = practice::level_histogram(&state.storage, user.id, &language).await?;
    Ok(Json(StatsResponse {
        language: language.iso,
        levels,
    }))
}
