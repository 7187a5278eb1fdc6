use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};

use crate::db::models::DbUser;
use crate::error::PivotError;
use crate::router::PivotState;

/// Name of the encrypted session cookie holding the user id.
pub const SESSION_COOKIE: &str = "pivot_session";

/// Extractor that resolves the authenticated user from the private session
/// cookie. Also bumps `last_seen`, so any authenticated request counts as
/// activity. Rejects with 401 when the cookie is missing or stale.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub DbUser);

impl FromRequestParts<PivotState> for CurrentUser {
    type Rejection = PivotError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &PivotState,
    ) -> Result<Self, Self::Rejection> {
        // the key type must be spelled out: both `FromRef<PivotState> for Key`
        // and the blanket `FromRef<T> for T` would otherwise apply
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| PivotError::Unauthorized)?;
        let user_id = jar
            .get(SESSION_COOKIE)
            .and_then(|c| c.value().parse::<i64>().ok())
            .ok_or(PivotError::Unauthorized)?;
        let user = state
            .storage
            .user_by_id(user_id)
            .await?
            .ok_or(PivotError::Unauthorized)?;
        state.storage.touch_last_seen(user.id).await?;
        Ok(Self(user))
    }
}
