//! Recipe enrichment.
//!
//! [`Enricher`] turns a [`Recipe`] into an [`EnrichmentRecord`]: it consults the
//! content cache, asks the provider on a miss, then parses, repairs and
//! validates the reply. Provider calls through validation are retried as one
//! unit under a [`RetryPolicy`].

mod prompts;
pub mod record;
pub mod repair;
pub mod retry;

pub use prompts::{render_user_prompt, SYSTEM_PROMPT};
pub use record::{
    Categories, EaseOfCooking, EnrichmentRecord, HealthinessScore, IngredientAvailability,
    MealPrepGuidance, ProteinLevel,
};
pub use repair::{repair, RepairStep, REPAIR_PIPELINE};
pub use retry::RetryPolicy;

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::RecipeCache;
use crate::llm::response::{parse_lenient, sentinel_error};
use crate::llm::{LlmError, LlmProvider};
use crate::recipe::Recipe;

/// Error type for enrichment operations.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Provider returned an error payload: {0}")]
    ProviderSentinel(String),

    #[error("Failed to parse LLM response: {0}")]
    Parse(String),

    #[error("Enrichment produced invalid data: {0}")]
    Validation(String),
}

/// Enriches recipes with one provider, one cache and one retry policy.
#[derive(Debug, Clone)]
pub struct Enricher {
    provider: Arc<dyn LlmProvider>,
    cache: RecipeCache,
    retry: RetryPolicy,
}

impl Enricher {
    pub fn new(provider: Arc<dyn LlmProvider>, cache: RecipeCache, retry: RetryPolicy) -> Self {
        Self {
            provider,
            cache,
            retry,
        }
    }

    /// Identifier of the provider and model, part of every cache key.
    pub fn model_id(&self) -> String {
        format!(
            "{}-{}",
            self.provider.provider_name(),
            self.provider.model_name()
        )
    }

    pub fn cache(&self) -> &RecipeCache {
        &self.cache
    }

    /// Enrich a recipe in place and return the attached record.
    ///
    /// A valid cache entry short-circuits the provider. Otherwise the repaired
    /// payload is cached once an attempt validates.
    pub async fn enrich_recipe(
        &self,
        recipe: &mut Recipe,
    ) -> Result<EnrichmentRecord, EnrichmentError> {
        let model_id = self.model_id();

        if let Some(record) = self.cached_record(recipe, &model_id) {
            recipe.enrichment = Some(record.clone());
            return Ok(record);
        }

        let source: &Recipe = recipe;
        let (record, payload) = self
            .retry
            .run(|attempt| self.attempt(source, attempt))
            .await?;

        self.cache.set(recipe, &model_id, &payload);

        tracing::info!(recipe = %recipe.title, model = %model_id, "Recipe enriched");
        recipe.enrichment = Some(record.clone());
        Ok(record)
    }

    /// Owned variant of [`Enricher::enrich_recipe`].
    pub async fn enrich(&self, mut recipe: Recipe) -> Result<Recipe, EnrichmentError> {
        self.enrich_recipe(&mut recipe).await?;
        Ok(recipe)
    }

    fn cached_record(&self, recipe: &Recipe, model_id: &str) -> Option<EnrichmentRecord> {
        let payload = self.cache.get(recipe, model_id)?;

        match EnrichmentRecord::from_value(payload) {
            Ok(record) => {
                tracing::debug!(recipe = %recipe.title, model = model_id, "Enrichment cache hit");
                Some(record)
            }
            Err(e) => {
                tracing::warn!(
                    recipe = %recipe.title,
                    error = %e,
                    "Cached enrichment no longer validates, ignoring"
                );
                None
            }
        }
    }

    /// One provider round trip: prompt, call, parse, repair, validate.
    async fn attempt(
        &self,
        recipe: &Recipe,
        attempt: u32,
    ) -> Result<(EnrichmentRecord, Value), EnrichmentError> {
        tracing::debug!(recipe = %recipe.title, attempt = attempt + 1, "Requesting enrichment");

        let user = render_user_prompt(recipe);
        let text = self.provider.complete(SYSTEM_PROMPT, &user).await?;

        if let Some(message) = sentinel_error(&text) {
            return Err(EnrichmentError::ProviderSentinel(message));
        }

        let mut payload = match parse_lenient(&text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(EnrichmentError::Parse(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(EnrichmentError::Parse(e.to_string())),
        };

        repair(&mut payload, recipe);

        let record = EnrichmentRecord::from_payload(&payload)
            .map_err(|e| EnrichmentError::Validation(e.to_string()))?;

        Ok((record, Value::Object(payload)))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
