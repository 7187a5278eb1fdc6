use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PivotError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("no vocable is due for practice")]
    NothingDue,

    #[error("password hash error: {0}")]
    PasswordHash(String),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),
}

impl PivotError {
    /// True when the underlying database error is a UNIQUE constraint hit,
    /// e.g. a duplicate username or email at registration.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, PivotError::Database(SqlxError::Database(db)) if db.is_unique_violation())
    }
}

impl IntoResponse for PivotError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match &self {
            PivotError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorBody {
                    code: "VALIDATION".to_string(),
                    message: msg.clone(),
                },
            ),
            PivotError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Authentication required.".to_string(),
                },
            ),
            PivotError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message: "Invalid username or password.".to_string(),
                },
            ),
            PivotError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    code: "FORBIDDEN".to_string(),
                    message: "You do not own this resource.".to_string(),
                },
            ),
            PivotError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{what} not found."),
                },
            ),
            PivotError::NothingDue => (
                StatusCode::CONFLICT,
                ApiErrorBody {
                    code: "NOTHING_DUE".to_string(),
                    message: "No vocable is due; add vocabulary or edit existing entries first."
                        .to_string(),
                },
            ),
            PivotError::Database(_) | PivotError::PasswordHash(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                    },
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
