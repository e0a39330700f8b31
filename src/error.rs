use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::DatabaseError;

/// Request-level failures. Every variant renders as `{ msg, error? }`;
/// only storage failures carry the raw `error` text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Business-rule conflict, such as a deal already booked for a trainer.
    #[error("{0}")]
    Conflict(String),

    /// None of the requested trainer names matched a trainer record.
    #[error("{0}")]
    UnknownTrainers(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::Conflict(_) | AppError::UnknownTrainers(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Database(err) => {
                error!(error = %err, "Request failed on storage");
                json!({ "msg": "Server error", "error": err.to_string() })
            }
            other => json!({ "msg": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::UnknownTrainers("none".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("gone".into()).status(), StatusCode::NOT_FOUND);
        let db = AppError::Database(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
