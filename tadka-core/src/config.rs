//! Enrichment configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::cache::RecipeCache;
use crate::enrichment::RetryPolicy;
use crate::llm::{LlmError, ProviderKind};

/// Default input file of scraped recipes.
pub const DEFAULT_INPUT_FILE: &str = "recipes.json";

/// Default directory for enriched output files.
pub const DEFAULT_OUTPUT_DIR: &str = "enriched_recipes";

/// Default number of recipes per output batch file.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause before the first retry, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },

    #[error(transparent)]
    Provider(#[from] LlmError),
}

/// Which provider to build and how to reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    /// Credential for the selected backend, if one was found.
    pub api_key: Option<String>,
    /// Alternative endpoint for OpenAI-compatible gateways.
    pub base_url: Option<String>,
}

/// Everything the enrichment driver needs.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub provider: ProviderConfig,
    pub retry: RetryPolicy,
    pub cache_dir: PathBuf,
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub batch_size: usize,
    /// Also write logs to this file when set.
    pub log_file: Option<PathBuf>,
}

impl EnrichConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `TADKA_PROVIDER`: openai, claude, gemini or fake (default: openai)
    /// - `TADKA_MODEL`: model name (default depends on the provider)
    /// - `OPENAI_API_KEY` (or `OPENAI_TOKEN`), `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`
    /// - `TADKA_OPENAI_BASE_URL`: OpenAI-compatible endpoint
    /// - `TADKA_MAX_RETRIES`: attempts per recipe (default: 3)
    /// - `TADKA_RETRY_DELAY_MS`: first retry delay (default: 1000)
    /// - `TADKA_CACHE_DIR`: cache directory (default: "~/.tadka/cache")
    /// - `TADKA_INPUT_FILE`, `TADKA_OUTPUT_DIR`, `TADKA_BATCH_SIZE`, `TADKA_LOG_FILE`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let kind = match get("TADKA_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKind>()?,
            None => ProviderKind::OpenAi,
        };

        let model = get("TADKA_MODEL").unwrap_or_else(|| kind.default_model().to_string());

        let api_key = match kind {
            ProviderKind::OpenAi => get("OPENAI_API_KEY").or_else(|| get("OPENAI_TOKEN")),
            other => other.api_key_var().and_then(&get),
        };

        let base_url = match kind {
            ProviderKind::OpenAi => get("TADKA_OPENAI_BASE_URL"),
            _ => None,
        };

        let max_attempts = parse_var::<u32>(&get, "TADKA_MAX_RETRIES")?.unwrap_or(3);
        let delay_ms =
            parse_var::<u64>(&get, "TADKA_RETRY_DELAY_MS")?.unwrap_or(DEFAULT_RETRY_DELAY_MS);

        let batch_size = match parse_var::<usize>(&get, "TADKA_BATCH_SIZE")? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    var: "TADKA_BATCH_SIZE".to_string(),
                    value: "0".to_string(),
                })
            }
            Some(size) => size,
            None => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            provider: ProviderConfig {
                kind,
                model,
                api_key,
                base_url,
            },
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(delay_ms)),
            cache_dir: get("TADKA_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(RecipeCache::default_dir),
            input_file: get("TADKA_INPUT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE)),
            output_dir: get("TADKA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            batch_size,
            log_file: get("TADKA_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse_var<T: FromStr>(
    get: impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>, ConfigError> {
    get(var)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: var.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<EnrichConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnrichConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.provider.api_key, None);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
        assert_eq!(config.input_file, PathBuf::from("recipes.json"));
        assert_eq!(config.output_dir, PathBuf::from("enriched_recipes"));
        assert_eq!(config.batch_size, 10);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_provider_selection() {
        let config = load(&[
            ("TADKA_PROVIDER", "claude"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("TADKA_OPENAI_BASE_URL", "https://openrouter.ai/api/v1"),
        ])
        .unwrap();

        assert_eq!(config.provider.kind, ProviderKind::Claude);
        assert_eq!(config.provider.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-ant"));
        assert_eq!(config.provider.base_url, None);
    }

    #[test]
    fn test_openai_token_fallback() {
        let config = load(&[("OPENAI_API_KEY", " "), ("OPENAI_TOKEN", "tok")]).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("tok"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TADKA_PROVIDER", "gemini"),
            ("TADKA_MODEL", "gemini-1.5-pro"),
            ("TADKA_MAX_RETRIES", "5"),
            ("TADKA_RETRY_DELAY_MS", "250"),
            ("TADKA_CACHE_DIR", "/tmp/tadka-cache"),
            ("TADKA_BATCH_SIZE", "4"),
            ("TADKA_LOG_FILE", "tadka.log"),
        ])
        .unwrap();

        assert_eq!(config.provider.model, "gemini-1.5-pro");
        assert_eq!(config.retry, RetryPolicy::new(5, Duration::from_millis(250)));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/tadka-cache"));
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.log_file, Some(PathBuf::from("tadka.log")));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("TADKA_MAX_RETRIES", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TADKA_MAX_RETRIES"));

        let err = load(&[("TADKA_BATCH_SIZE", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = load(&[("TADKA_PROVIDER", "mistral")]).unwrap_err();
        assert!(matches!(err, ConfigError::Provider(_)));
    }
}
