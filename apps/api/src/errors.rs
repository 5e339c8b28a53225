use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::evaluation::parser::ParseError;
use crate::extraction::ExtractError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;

        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Extract(e) => match e {
                ExtractError::UnsupportedFormat(_) => (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "UNSUPPORTED_FORMAT",
                    e.to_string(),
                ),
                ExtractError::Failed { .. } => {
                    tracing::warn!("Extraction error: {e}");
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "EXTRACTION_ERROR",
                        e.to_string(),
                    )
                }
                ExtractError::EmptyDocument => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EMPTY_DOCUMENT",
                    e.to_string(),
                ),
            },
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                match e {
                    LlmError::Auth { .. } => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_AUTH_ERROR",
                        "The AI provider rejected the configured credentials".to_string(),
                    ),
                    LlmError::RateLimited(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "LLM_RATE_LIMITED",
                        "The AI provider is rate limiting requests; try again later".to_string(),
                    ),
                    LlmError::Transport(_) => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_TRANSPORT_ERROR",
                        "The AI provider could not be reached".to_string(),
                    ),
                }
            }
            AppError::Parse(e) => match e {
                ParseError::Unparseable { raw_reply, .. } => {
                    details = Some(json!({ "raw_reply": raw_reply }));
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "UNPARSEABLE_RESPONSE",
                        e.to_string(),
                    )
                }
                ParseError::InvalidMatchValue(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_MATCH_VALUE",
                    e.to_string(),
                ),
            },
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
