/// LLM Client: the single point of entry for hosted-model calls.
///
/// No other module talks to a provider API directly. Handlers and the evaluation
/// pipeline only see `Arc<dyn LlmClient>`, built once at startup by `build_client`.
///
/// One request per `invoke`: no retries, no streaming, no caching.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::{LlmConfig, LlmProvider};

pub mod gemini;
pub mod nvidia;

pub use gemini::GeminiClient;
pub use nvidia::NvidiaClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM provider rejected the credentials (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("LLM provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("LLM transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Transport(format!("request timed out: {e}"))
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

/// A hosted model that turns a text prompt into a text reply.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logs and the health endpoint.
    fn model(&self) -> &str;
}

/// Builds the configured provider client.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let http = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;

    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Gemini => Arc::new(GeminiClient::new(http, config)),
        LlmProvider::Nvidia => Arc::new(NvidiaClient::new(http, config)),
    };
    Ok(client)
}

/// Maps a non-success HTTP status to the error taxonomy.
pub(crate) fn classify_status(status: StatusCode, message: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        _ => LlmError::Transport(format!("API error (status {}): {}", status.as_u16(), message)),
    }
}
