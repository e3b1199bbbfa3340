//! Fake LLM provider for testing.
//!
//! This provider returns deterministic responses based on prompt matching,
//! allowing tests to run without network access or API costs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

/// A complete, valid enrichment payload for a simple steamed dish.
pub const SAMPLE_ENRICHMENT: &str = r#"{
    "title": "Idli",
    "generated_summary": "Soft, fluffy steamed rice cakes that make a light South Indian breakfast.",
    "ingredients": ["2 cups rice"],
    "instructions": ["Steam 10 min"],
    "healthiness_score": "Healthy",
    "ease_of_cooking_score": "Easy",
    "indian_ingredient_availability_score": "Very High",
    "prep_time_minutes": 20,
    "prep_time_breakdown": {"grinding_batter": 15, "greasing_moulds": 5},
    "prep_notes": "Batter must ferment overnight",
    "total_cooking_time_minutes": 10,
    "cooking_time_breakdown": {"steaming": 10},
    "soaking_required": true,
    "soaking_time_minutes": 240,
    "protein_level": "Medium",
    "meal_type_suitability": ["Breakfast", "Snack"],
    "dietary_restrictions": ["Vegetarian", "Gluten-Free"],
    "categories": {
        "meal_type": ["Breakfast"],
        "dish_type": ["Snack"],
        "cooking_method": ["Steaming"],
        "region": ["South Indian"]
    },
    "meal_prep_guidance": {
        "components_to_prep": ["batter"],
        "prep_instructions": {"batter": "Grind soaked rice and dal, then ferment"},
        "storage_info": {"batter": "Refrigerate up to 3 days"},
        "final_assembly": "Steam fresh batter in greased moulds",
        "time_saving_tips": ["Grind a double batch of batter"]
    }
}"#;

/// A fake LLM provider for testing.
///
/// Queued responses are returned first, in order. After that, responses are
/// matched by checking if the user message contains a registered substring.
/// If no match is found, returns a default response or error.
#[derive(Debug)]
pub struct FakeProvider {
    /// Map of prompt substring -> response
    responses: RwLock<HashMap<String, String>>,
    /// Responses handed out once each, before any matching
    queue: Mutex<VecDeque<String>>,
    /// Default response if no match found
    default_response: Option<String>,
    calls: AtomicUsize,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            default_response: Some("{}".to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeProvider {
    /// Create a new FakeProvider with no registered responses.
    pub fn new() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    /// Create a FakeProvider that returns a specific response for prompts containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Create a FakeProvider that answers every prompt with [`SAMPLE_ENRICHMENT`].
    pub fn with_enrichment_response() -> Self {
        Self::new().with_default_response(SAMPLE_ENRICHMENT)
    }

    /// Create a FakeProvider that returns the given responses in order.
    pub fn with_sequence<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for response in responses {
            provider.push_response(response);
        }
        provider
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        self.responses
            .write()
            .unwrap()
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Queue a response to be returned by the next unanswered call.
    pub fn push_response(&self, response: impl Into<String>) {
        self.queue.lock().unwrap().push_back(response.into());
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Number of times `complete` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(queued) = self.queue.lock().unwrap().pop_front() {
            return Ok(queued);
        }

        let responses = self.responses.read().unwrap();

        // Find first matching pattern (case-insensitive)
        let prompt_lower = user.to_lowercase();
        for (pattern, response) in responses.iter() {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        // Return default or error
        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                user.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
