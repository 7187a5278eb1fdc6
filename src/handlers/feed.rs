use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::config::CONFIG;
use crate::db::models::DbPost;
use crate::error::PivotError;
use crate::handlers::{PageQuery, Paginated};
use crate::middleware::CurrentUser;
use crate::router::PivotState;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
}

/// GET /posts?page= -> the shared feed, newest first.
pub async fn list_posts(
    State(state): State<PivotState>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<DbPost>>, PivotError> {
    let page = query.page.max(1);
    let per_page = CONFIG.posts_per_page;
    let offset = i64::from(page - 1) * i64::from(per_page);
    let items = state
        .storage
        .posts_page(i64::from(per_page), offset)
        .await?;
    let total = state.storage.count_posts().await?;
    Ok(Json(Paginated::new(items, page, per_page, total)))
}

/// POST /posts
pub async fn create_post(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, PivotError> {
    if req.body.is_empty() || req.body.len() > 500 {
        return Err(PivotError::Validation(
            "post body must be between 1 and 500 characters".to_string(),
        ));
    }
    let id = state.storage.insert_post(user.id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}
