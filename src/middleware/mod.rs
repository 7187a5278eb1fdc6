pub mod auth;

pub use auth::{CurrentUser, SESSION_COOKIE};
