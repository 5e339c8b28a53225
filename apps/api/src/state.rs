use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// The single configured provider client, validated at startup.
    pub llm: Arc<dyn LlmClient>,
    pub config: Config,
}
