use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Request pipeline errors. Input problems are rejected before any
/// external call; everything upstream collapses into a generic server
/// error for the caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("no speech recognized in audio")]
    NothingRecognized,

    #[error("{service} returned status {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NothingRecognized => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::Upstream { .. } => {
                error!("upstream failure: {}", self);
                (StatusCode::BAD_GATEWAY, "upstream service error".to_string())
            }
            AppError::Http(_) | AppError::Internal(_) => {
                error!("request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
