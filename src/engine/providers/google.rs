// Mdm Teo — Google Gemini Provider
// Implements the Generator trait with one non-streaming generateContent call.
// No retries: a failed call just means this batch produces no reply.

use crate::atoms::constants::{GENERATION_TIMEOUT_SECS, GOOGLE_BASE_URL};
use crate::atoms::traits::{GenerationError, Generator, PromptRequest};
use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use serde_json::{json, Value};

// ── Struct ────────────────────────────────────────────────────────────────────

pub struct GoogleProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GoogleProvider {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        GoogleProvider {
            client: Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(GENERATION_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: base_url.unwrap_or(GOOGLE_BASE_URL).trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn build_body(request: &PromptRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}]
            }],
        });
        if !request.system_instruction.trim().is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{"text": request.system_instruction}]
            });
        }
        body
    }

    /// Pull the reply text out of a generateContent response body.
    pub fn parse_response(v: &Value) -> Result<String, GenerationError> {
        let Some(candidate) = v["candidates"].as_array().and_then(|c| c.first()) else {
            // Prompt-level block: no candidates, only promptFeedback.
            if let Some(reason) = v["promptFeedback"]["blockReason"].as_str() {
                return Err(GenerationError::Blocked(reason.to_string()));
            }
            return Err(GenerationError::EmptyResponse);
        };

        let finish_reason = candidate["finishReason"].as_str().unwrap_or("STOP");
        let text: String = candidate["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    // Skip thinking-model thought parts
                    .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
                    .filter_map(|p| p["text"].as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return match finish_reason {
                "STOP" | "MAX_TOKENS" => Err(GenerationError::EmptyResponse),
                other => {
                    warn!("[google] Empty response with finishReason={}", other);
                    Err(GenerationError::Blocked(other.to_string()))
                }
            };
        }
        Ok(text)
    }
}

// ── Generator trait implementation ────────────────────────────────────────────

#[async_trait]
impl Generator for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        let body = Self::build_body(request);
        info!("[google] Request model={} prompt_len={}", self.model, request.prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let snippet = crate::engine::channels::truncate_utf8(&body_text, 200).to_string();
            error!("[google] API error {}: {}", status, snippet);
            return Err(if status == 401 || status == 403 {
                GenerationError::Auth(format!("API error {status}"))
            } else {
                GenerationError::Api { status, message: snippet }
            });
        }

        let v: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("Bad response body: {}", e.without_url())))?;
        Self::parse_response(&v)
    }
}
