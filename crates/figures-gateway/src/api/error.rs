//! HTTP polish for `FiguresError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use figures_core::error::FiguresError;

/// Boundary wrapper so core errors can be returned from axum handlers.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub FiguresError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.client_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.client_code();
        // internal details stay in the logs
        let detail = match &self.0 {
            FiguresError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        let mut resp = (status, Json(json!({ "code": code.as_str(), "detail": detail }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            resp.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Token"),
            );
        }
        resp
    }
}
