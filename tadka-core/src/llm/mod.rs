//! LLM provider abstraction for recipe enrichment.
//!
//! Every backend implements [`LlmProvider`]: given a system message and a user
//! message, return the model's raw text. Backends that may wrap their JSON in
//! markdown fences or return nothing hand back a sentinel error payload
//! (`{"error": "..."}`) instead of failing, see [`response`].

mod claude;
mod fake;
mod gemini;
mod openai;
pub mod response;
mod transport;

pub use claude::ClaudeProvider;
pub use fake::{FakeProvider, SAMPLE_ENRICHMENT};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ProviderConfig;

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe. The provider is responsible
/// for building the vendor request and extracting plain text from the vendor response.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a system and user message to the LLM and get a text response.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "claude", "openai", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name (e.g., "claude-3-5-sonnet-20241022").
    fn model_name(&self) -> &str;
}

/// Which backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Claude,
    Gemini,
    Fake,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Fake => "fake",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Claude => "claude-3-5-sonnet-20241022",
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Fake => "fake-model",
        }
    }

    /// Environment variable holding this backend's credential.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Claude => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Fake => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "fake" => Ok(ProviderKind::Fake),
            other => Err(LlmError::NotConfigured(format!(
                "Unknown provider: {}",
                other
            ))),
        }
    }
}

/// Build the provider selected by configuration.
///
/// Fails if the selected backend's credential is missing.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let api_key = || {
        config.api_key.clone().ok_or_else(|| {
            LlmError::NotConfigured(format!(
                "{} not set",
                config.kind.api_key_var().unwrap_or("API key")
            ))
        })
    };

    let provider: Arc<dyn LlmProvider> = match config.kind {
        ProviderKind::Fake => Arc::new(FakeProvider::with_enrichment_response()),
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(api_key()?, config.model.clone())?;
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(api_key()?, config.model.clone())?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(api_key()?, config.model.clone())?),
    };

    tracing::info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        "LLM provider configured"
    );

    Ok(provider)
}

/// Reject a missing or blank credential at construction time.
fn require_api_key(api_key: String, var: &str) -> Result<String, LlmError> {
    if api_key.trim().is_empty() {
        return Err(LlmError::NotConfigured(format!("{} not set", var)));
    }
    Ok(api_key)
}
