use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::chain::ChainError;

/// Errors returned by the translation server's HTTP surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Validation(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(msg) => {
                warn!("Rejected request: {}", msg);
                json!({
                    "detail": [{
                        "loc": ["body"],
                        "msg": msg,
                        "type": "value_error"
                    }]
                })
            }
            ApiError::Chain(e) => {
                error!(error = %e, "Chain invocation failed");
                json!({ "detail": e.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}
