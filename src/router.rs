use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::Key;

use crate::db::sqlite::Storage;
use crate::handlers::{auth, feed, practice, profile, vocabulary};

#[derive(Clone)]
pub struct PivotState {
    pub storage: Storage,
    key: Key,
}

impl PivotState {
    pub fn new(storage: Storage, key: Key) -> Self {
        Self { storage, key }
    }
}

// Required by PrivateCookieJar to find the encryption key.
impl FromRef<PivotState> for Key {
    fn from_ref(state: &PivotState) -> Key {
        state.key.clone()
    }
}

pub fn pivot_router(state: PivotState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/languages", get(profile::languages))
        .route("/me", get(profile::me).put(profile::update_me))
        .route("/users/{username}", get(profile::user_page))
        .route("/posts", get(feed::list_posts).post(feed::create_post))
        .route(
            "/vocabulary",
            get(vocabulary::list).post(vocabulary::create),
        )
        .route(
            "/vocabulary/{id}",
            get(vocabulary::get_one)
                .put(vocabulary::update)
                .delete(vocabulary::delete),
        )
        .route("/practice/config", post(practice::configure))
        .route("/practice/next", post(practice::next))
        .route("/practice/answer", post(practice::answer))
        .route("/practice/reset", post(practice::reset))
        .route("/practice/stats", get(practice::stats))
        .with_state(state)
}
