use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DEFAULT_GEMINI_API_URL;
use crate::error::{Error, Result};
use crate::llm::provider::LLMProvider;

const PROBE_PROMPT: &str = "Test";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Accept both `gemini-1.5-pro` and `models/gemini-1.5-pro`.
fn normalize_model(model: &str) -> &str {
    model.trim().trim_start_matches("models/")
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, model, Duration::from_secs(120))
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let model = model.into();

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: normalize_model(&model).to_string(),
            base_url: DEFAULT_GEMINI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Probe each candidate model in order and keep the first that answers.
    pub async fn connect(
        api_key: &str,
        candidates: &[String],
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut last_error = String::from("no candidate models configured");

        for candidate in candidates {
            let provider = Self::with_timeout(api_key, candidate.as_str(), timeout)?
                .with_base_url(base_url);

            match provider.generate(PROBE_PROMPT).await {
                Ok(_) => {
                    tracing::info!("Using Gemini model {}", provider.model);
                    return Ok(provider);
                }
                Err(e) => {
                    tracing::warn!("Gemini model {} unavailable: {}", provider.model, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::NoModelAvailable(last_error))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!(model = %self.model, chars = prompt.len(), "Sending prompt to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to send request: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    Error::LLMApi(format!("Gemini rate limit exceeded: {}", body))
                }
                _ => Error::LLMApi(format!("Gemini API error ({}): {}", status, body)),
            });
        }

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| {
                Error::LLMApi(format!("Failed to parse Gemini response: {}", e.without_url()))
            })?;

        let text = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let detail = result
                .prompt_feedback
                .map(|f| f.to_string())
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(Error::LLMApi(format!("Empty response from Gemini ({})", detail)));
        }

        Ok(text.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}
