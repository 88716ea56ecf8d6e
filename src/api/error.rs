use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::EngineError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Maps `EngineError` to an HTTP status per the error handling policy (§7): validation and
/// `NotFound`/`InvalidQuantity` are caller-visible client errors, `Persistence` is a caller-
/// visible server error the client may retry, `Corruption` never reaches a running API (it is
/// fatal to startup) but is mapped defensively anyway.
#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            EngineError::Duplicate(_) => StatusCode::CONFLICT,
            EngineError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Corruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": {
                "message": self.0.to_string(),
                "code": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}
