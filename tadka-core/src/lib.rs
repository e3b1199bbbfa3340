pub mod batch;
pub mod cache;
pub mod config;
pub mod enrichment;
pub mod llm;
pub mod recipe;

pub use batch::{enrich_all, load_recipes, save_recipes, BatchError, BatchFailure, BatchOutcome};
pub use cache::{CacheStats, RecipeCache};
pub use config::{ConfigError, EnrichConfig, ProviderConfig};
pub use enrichment::{Enricher, EnrichmentError, EnrichmentRecord, RetryPolicy};
pub use llm::{create_provider, LlmError, LlmProvider, ProviderKind};
pub use recipe::Recipe;
