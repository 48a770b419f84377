use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::{ChatRequest, ChatResponse};

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Errors that can occur while talking to a model backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("Backend configuration error: {0}")]
    ConfigError(String),
}

/// Connection settings for a model backend.
///
/// Credentials are passed in explicitly; nothing here reads the environment.
#[derive(Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A language model that accepts a transcript plus tool manifest and returns
/// either text or a batch of tool calls
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Human-readable name of the backend (e.g., "OpenAI")
    fn name(&self) -> &str;

    /// Run one completion round-trip
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, BackendError>;
}
