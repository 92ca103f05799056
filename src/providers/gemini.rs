// Gemini generateContent provider implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::{GenerateRequest, GenerateResponse, GenerationConfig};
use super::ModelGateway;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Longest slice of an error body kept in the error message
const ERROR_BODY_LIMIT: usize = 512;

/// Gemini API provider
///
/// The API key travels in the `x-goog-api-key` header rather than the query
/// string so that request URLs can be logged safely.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider for the public endpoint and default model
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_settings(
            api_key,
            DEFAULT_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a provider with custom settings
    pub fn with_settings(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelGateway for GeminiProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerateResponse> {
        let request = GenerateRequest::from_prompt(prompt, config);
        let url = self.endpoint();

        // Prompt text stays out of the logs
        tracing::debug!(
            model = %self.model,
            temperature = config.temperature,
            max_output_tokens = config.max_output_tokens,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();

        if !status.is_success() {
            let mut error_body = response.text().await.unwrap_or_default();
            if error_body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !error_body.is_char_boundary(cut) {
                    cut -= 1;
                }
                error_body.truncate(cut);
            }
            anyhow::bail!(
                "Gemini API request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        tracing::debug!(
            candidates = generate_response.candidates.len(),
            "Received response from Gemini API"
        );

        Ok(generate_response)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
