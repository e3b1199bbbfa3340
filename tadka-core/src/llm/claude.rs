//! Claude (Anthropic) LLM provider.

use super::response::recover_json;
use super::transport::send_json;
use super::{require_api_key, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Output token ceiling for every request.
const MAX_TOKENS: u32 = 4096;

/// Claude API provider.
#[derive(Debug)]
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ClaudeProvider {
    /// Create a new ClaudeProvider with the given API key and model.
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: require_api_key(api_key, "ANTHROPIC_API_KEY")?,
            model,
            client: reqwest::Client::new(),
        })
    }

    fn build_request(&self, system: &str, user: &str) -> ClaudeRequest {
        ClaudeRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.to_string(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        }
    }
}

/// Claude API request format.
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

/// Claude API response format.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

/// Extract the first text block from a messages response body.
fn extract_text(body: &str) -> Result<String, LlmError> {
    let response: ClaudeResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;

    response
        .content
        .into_iter()
        .find_map(|c| {
            if c.content_type == "text" {
                c.text
            } else {
                None
            }
        })
        .ok_or_else(|| LlmError::ParseError("No text content in response".to_string()))
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");

        let body = send_json(request, &self.build_request(system, user)).await?;
        let text = extract_text(&body)?;

        Ok(recover_json(&text))
    }

    fn provider_name(&self) -> &'static str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
