//! HTTP handlers for the server.

pub mod document;
pub mod ledger;
pub mod print;
pub mod templates;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::CartelError;

/// A [`CartelError`] rendered as a JSON error response.
pub struct ApiError(pub CartelError);

impl From<CartelError> for ApiError {
    fn from(err: CartelError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CartelError::UnknownField(_) | CartelError::InvalidValue { .. } => {
                StatusCode::BAD_REQUEST
            }
            CartelError::UnknownFamily(_) | CartelError::Catalog(_) => StatusCode::NOT_FOUND,
            CartelError::JustificationTooShort { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CartelError::ReportSendFailed(_) => StatusCode::BAD_GATEWAY,
            CartelError::PrintSurfaceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.0.to_string(),
            "recoverable": self.0.is_user_recoverable(),
            "guidance": self.0.guidance(),
        });
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
