use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use kembara_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    /// A booking rule refused the request
    Rejected { code: &'static str, message: String, details: Option<Value> },
    BadRequest(String),
    NotFoundError(String),
    UpstreamError(String),
}

impl AppError {
    pub fn rejected(code: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Rejected { code, message: err.to_string(), details: None }
    }

    pub fn with_details(self, details: Value) -> Self {
        match self {
            AppError::Rejected { code, message, .. } => AppError::Rejected { code, message, details: Some(details) },
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Rejected { code, message, details } => {
                let mut body = json!({ "error": message, "code": code });
                if let Some(details) = details {
                    body["details"] = details;
                }
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({ "error": "Availability service unavailable" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::UpstreamError(err.to_string())
    }
}
