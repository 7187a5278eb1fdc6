use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::models::{DbLanguage, DbPost, DbUser};
use crate::error::PivotError;
use crate::middleware::CurrentUser;
use crate::router::PivotState;
use crate::service::accounts;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: DbUser,
    pub languages: Vec<DbLanguage>,
    pub vocable_count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserPageResponse {
    pub username: String,
    pub about_me: Option<String>,
    pub posts: Vec<DbPost>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub about_me: Option<String>,
    pub languages: Option<Vec<String>>,
}

/// GET /languages -> the immutable catalog.
pub async fn languages(
    State(state): State<PivotState>,
) -> Result<Json<Vec<DbLanguage>>, PivotError> {
    Ok(Json(state.storage.list_languages().await?))
}

/// GET /me
pub async fn me(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, PivotError> {
    let languages = state.storage.user_languages(user.id).await?;
    let vocable_count = state.storage.count_vocables(user.id).await?;
    Ok(Json(ProfileResponse {
        user,
        languages,
        vocable_count,
    }))
}

/// PUT /me -> edit username, about-me and the studied-language set.
pub async fn update_me(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, PivotError> {
    accounts::update_profile(
        &state.storage,
        &user,
        req.username.as_deref(),
        req.about_me.as_deref(),
        req.languages.as_deref(),
    )
    .await?;
    let user = state
        .storage
        .user_by_id(user.id)
        .await?
        .ok_or(PivotError::NotFound("user"))?;
    let languages = state.storage.user_languages(user.id).await?;
    let vocable_count = state.storage.count_vocables(user.id).await?;
    Ok(Json(ProfileResponse {
        user,
        languages,
        vocable_count,
    }))
}

/// GET /users/{username} -> public profile with the user's posts.
pub async fn user_page(
    State(state): State<PivotState>,
    CurrentUser(_): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<UserPageResponse>, PivotError> {
    let user = state
        .storage
        .user_by_username(&username)
        .await?
        .ok_or(PivotError::NotFound("user"))?;
    let posts = state.storage.posts_of_user(user.id).await?;
    Ok(Json(UserPageResponse {
        username: user.username,
        about_me: user.about_me,
        posts,
    }))
}
