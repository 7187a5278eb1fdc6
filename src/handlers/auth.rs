use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use time::Duration;
use tracing::info;

use crate::error::PivotError;
use crate::middleware::{CurrentUser, SESSION_COOKIE};
use crate::router::PivotState;
use crate::service::{accounts, session};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// POST /auth/register
pub async fn register(
    State(state): State<PivotState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, PivotError> {
    let user_id = accounts::register(&state.storage, &req.username, &req.email, &req.password).await?;
    info!(user_id, username = %req.username, "user registered");
    Ok((StatusCode::CREATED, Json(json!({ "id": user_id }))))
}

/// POST /auth/login -> sets the private session cookie.
pub async fn login(
    State(state): State<PivotState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, PivotError> {
    let user = accounts::authenticate(&state.storage, &req.username, &req.password).await?;
    let jar = jar.add(session_cookie(user.id, req.remember));
    info!(user_id = user.id, "user logged in");
    Ok((jar, Json(user)))
}

/// POST /auth/logout -> clears the practice cursor and removes the cookie.
pub async fn logout(
    State(state): State<PivotState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, PivotError> {
    session::clear(&state.storage, user.id).await?;
    let jar = jar.remove(clear_cookie());
    info!(user_id = user.id, "user logged out");
    Ok((jar, StatusCode::NO_CONTENT))
}

fn session_cookie(user_id: i64, remember: bool) -> Cookie<'static> {
    let mut builder = Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), user_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if remember {
        builder = builder.max_age(Duration::days(30));
    }
    builder.build()
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
