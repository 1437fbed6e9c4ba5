//! API error type with IntoResponse
//!
//! Retrieval errors become JSON bodies whose status depends on the error
//! kind, so clients never parse message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fraudboard_core::{DashboardError, ErrorKind};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub DashboardError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Configuration | ErrorKind::Connection => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::DataRetrieval => StatusCode::BAD_GATEWAY,
            ErrorKind::Fixture => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.0.kind() {
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Connection => "database_unavailable",
            ErrorKind::DataRetrieval => "data_retrieval_error",
            ErrorKind::Fixture => "fixture_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = ?self.0.kind(), "{}", self.0);
        }

        let body = json!({
            "error": self.code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        Self(e)
    }
}
