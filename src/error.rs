use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error")]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Duplicate entry")]
    Conflict(String),

    #[error("Internal Server Error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(details),
            ),
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found"), None)
            }
            ApiError::Conflict(details) => (
                StatusCode::CONFLICT,
                "Duplicate entry".to_string(),
                Some(vec![details]),
            ),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                details,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Surface unique-key violations as 409 instead of an opaque 500.
        if let Some(db_err) = err.downcast_ref::<sqlx::Error>() {
            if let Some(db_err) = db_err.as_database_error() {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict(
                        "A record with this information already exists".into(),
                    );
                }
            }
        }
        ApiError::Internal(err)
    }
}
