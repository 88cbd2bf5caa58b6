//! HTTP mapping for shared errors (non-probe handlers).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use loanstat_core::error::LoanstatError;

#[derive(Debug)]
pub struct ApiError(pub LoanstatError);

impl From<LoanstatError> for ApiError {
    fn from(e: LoanstatError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LoanstatError::BadRequest(_) | LoanstatError::UnsupportedVersion => StatusCode::BAD_REQUEST,
            LoanstatError::NotFound(_) => StatusCode::NOT_FOUND,
            LoanstatError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LoanstatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
