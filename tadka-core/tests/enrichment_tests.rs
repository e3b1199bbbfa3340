//! End-to-end enrichment tests against the fake provider.
//!
//! Every test uses its own temporary cache directory, so they can run in
//! parallel and never touch `~/.tadka`.

use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tadka_core::enrichment::{HealthinessScore, ProteinLevel};
use tadka_core::llm::{FakeProvider, SAMPLE_ENRICHMENT};
use tadka_core::{
    enrich_all, load_recipes, Enricher, EnrichmentError, Recipe, RecipeCache, RetryPolicy,
};
use tempfile::TempDir;

fn idli() -> Recipe {
    Recipe::with_sections(
        "Idli",
        "Soft, fluffy steamed cakes made from fermented rice and lentil batter.",
        vec!["2 cups rice".to_string()],
        vec!["Steam 10 min".to_string()],
    )
}

fn new_enricher(provider: &Arc<FakeProvider>, cache_dir: &Path, attempts: u32) -> Enricher {
    Enricher::new(
        provider.clone(),
        RecipeCache::new(cache_dir.to_path_buf()),
        RetryPolicy::immediate(attempts),
    )
}

fn sample_without(fields: &[&str]) -> String {
    let mut payload: Value = serde_json::from_str(SAMPLE_ENRICHMENT).unwrap();
    let map = payload.as_object_mut().unwrap();
    for field in fields {
        map.remove(*field);
    }
    payload.to_string()
}

#[test]
fn test_fingerprint_determinism() {
    let base = RecipeCache::key_for(&idli(), "fake-fake-model");
    assert_eq!(base, RecipeCache::key_for(&idli(), "fake-fake-model"));

    let mut changed_title = idli();
    changed_title.title = "Rava Idli".to_string();

    let mut changed_ingredients = idli();
    changed_ingredients.ingredients.push("1 cup urad dal".to_string());

    let mut changed_instructions = idli();
    changed_instructions.instructions = vec!["Steam 12 min".to_string()];

    let mut changed_text = idli();
    changed_text.text.push_str(" Serve with chutney.");

    for variant in [
        changed_title,
        changed_ingredients,
        changed_instructions,
        changed_text,
    ] {
        assert_ne!(base, RecipeCache::key_for(&variant, "fake-fake-model"));
    }
}

#[test]
fn test_cache_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = RecipeCache::new(dir.path().to_path_buf());
    let payload = json!({ "title": "Idli", "prep_notes": "Ferment ½ day" });

    assert!(cache.set(&idli(), "claude-claude-3-5-sonnet-20241022", &payload));
    assert_eq!(
        cache.get(&idli(), "claude-claude-3-5-sonnet-20241022"),
        Some(payload)
    );
    assert_eq!(cache.get(&idli(), "gemini-gemini-1.5-flash"), None);
}

#[tokio::test]
async fn test_cache_hit_skips_provider() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new());
    let enricher = new_enricher(&provider, dir.path(), 3);

    let payload: Value = serde_json::from_str(SAMPLE_ENRICHMENT).unwrap();
    assert!(enricher.cache().set(&idli(), &enricher.model_id(), &payload));

    let record = enricher.enrich_recipe(&mut idli()).await.unwrap();

    assert_eq!(record.title, "Idli");
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn test_idempotent_extraction() {
    let text = "Ingredients:\n- 1 cup moong dal\n- 1 tsp cumin\nHow to make:\n1. Pressure cook dal\n2. Temper with cumin\nTags: dal";

    let first = Recipe::new("Moong Dal", text);
    let second = Recipe::new("Moong Dal", text);

    assert_eq!(first.ingredients, vec!["1 cup moong dal", "1 tsp cumin"]);
    assert_eq!(first.instructions, vec!["Pressure cook dal", "Temper with cumin"]);
    assert_eq!(first.ingredients, second.ingredients);
    assert_eq!(first.instructions, second.instructions);
}

#[tokio::test]
async fn test_required_field_completion() {
    let dir = TempDir::new().unwrap();
    let reply = sample_without(&["protein_level", "prep_time_minutes"]);
    let provider = Arc::new(FakeProvider::new().with_default_response(&reply));
    let enricher = new_enricher(&provider, dir.path(), 1);

    let record = enricher.enrich_recipe(&mut idli()).await.unwrap();

    assert_eq!(record.protein_level, ProteinLevel::Medium);
    assert_eq!(record.prep_time_minutes, 30);
    assert_eq!(record.total_cooking_time_minutes, 10);
}

#[tokio::test]
async fn test_retry_exhaustion_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new().with_default_response("Sure! Here is your recipe"));
    let enricher = new_enricher(&provider, dir.path(), 3);

    let mut recipe = idli();
    let err = enricher.enrich_recipe(&mut recipe).await.unwrap_err();

    assert!(matches!(err, EnrichmentError::Parse(_)), "{err}");
    assert_eq!(provider.call_count(), 3);
    assert!(recipe.enrichment.is_none());
    assert_eq!(enricher.cache().stats().cached_entries, 0);
    assert!(enricher.cache().get(&recipe, &enricher.model_id()).is_none());
}

#[tokio::test]
async fn test_idli_scenario() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::with_enrichment_response());
    let enricher = new_enricher(&provider, dir.path(), 3);

    let recipe = enricher.enrich(idli()).await.unwrap();
    let record = recipe.enrichment.unwrap();

    assert_eq!(record.title, "Idli");
    assert_eq!(record.ingredients, vec!["2 cups rice"]);
    assert_eq!(record.instructions, vec!["Steam 10 min"]);
    assert!(HealthinessScore::ALL.contains(&record.healthiness_score));
}

#[tokio::test]
async fn test_repeat_enrichment_calls_provider_once() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::with_enrichment_response());
    let enricher = new_enricher(&provider, dir.path(), 3);

    let first = enricher.enrich_recipe(&mut idli()).await.unwrap();
    let second = enricher.enrich_recipe(&mut idli()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.call_count(), 1);

    // A fresh enricher over the same directory sees the same entry.
    let other = new_enricher(&provider, dir.path(), 3);
    assert_eq!(other.enrich_recipe(&mut idli()).await.unwrap(), first);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_batch_failure_isolation() {
    let dir = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/recipes.json");
    let recipes = load_recipes(&fixtures).unwrap();
    assert_eq!(recipes.len(), 3);

    let provider = Arc::new(FakeProvider::with_enrichment_response());
    provider.add_response("Masala Chai", "not json");
    let enricher = new_enricher(&provider, dir.path(), 2);

    let outcome = enrich_all(&enricher, recipes).await;

    let titles: Vec<_> = outcome.enriched.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Idli", "Aloo Paratha"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].title, "Masala Chai");
    assert_eq!(enricher.cache().stats().cached_entries, 2);
}

#[tokio::test]
async fn test_source_fields_are_attached() {
    let dir = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/recipes.json");
    let mut recipes = load_recipes(&fixtures).unwrap();
    let recipe = recipes.remove(0);

    assert_eq!(recipe.ingredients, vec!["2 cups rice"]);
    assert_eq!(recipe.instructions, vec!["Steam 10 min"]);
    assert!(recipe.publish_date.is_some());

    let provider = Arc::new(FakeProvider::with_enrichment_response());
    let enricher = new_enricher(&provider, dir.path(), 1);
    let record = enricher.enrich(recipe).await.unwrap().enrichment.unwrap();

    assert_eq!(record.recipe_url.as_deref(), Some("https://example.com/recipes/idli"));
    assert_eq!(record.image_url.as_deref(), Some("https://example.com/images/idli.jpg"));
    assert_eq!(record.video_url.as_deref(), Some("https://example.com/videos/idli.mp4"));
    assert_eq!(record.additional_images.len(), 2);
    assert_eq!(record.original_categories, vec!["Breakfast"]);
}

#[tokio::test]
async fn test_error_object_with_extra_keys_is_retried() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(
        FakeProvider::new().with_default_response(r#"{"error": "model refused", "code": 500}"#),
    );
    let enricher = new_enricher(&provider, dir.path(), 3);

    let mut recipe = idli();
    let err = enricher.enrich_recipe(&mut recipe).await.unwrap_err();

    assert!(
        matches!(&err, EnrichmentError::ProviderSentinel(message) if message == "model refused"),
        "{err}"
    );
    assert_eq!(provider.call_count(), 3);
    assert!(recipe.enrichment.is_none());
    assert_eq!(enricher.cache().stats().cached_entries, 0);
}
