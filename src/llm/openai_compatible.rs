//! OpenAI-compatible text-generation client.
//!
//! Works against any endpoint implementing the Chat Completions API:
//! hosted providers, gateways, or local models served in OpenAI format.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::TextGenerator;

const PROVIDER_NAME: &str = "openai_compatible";

/// Chat Completions client implementing [`TextGenerator`].
pub struct OpenAiCompatibleGenerator {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatibleGenerator {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::MissingCredentials {
                provider: PROVIDER_NAME.to_string(),
            });
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("Failed to build reqwest client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Construct the API URL, tolerating base URLs with or without `/v1`.
    fn api_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        format!("{}/v1/{}", base, path.trim_start_matches('/'))
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, LlmError> {
        let url = self.api_url("chat/completions");
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::MissingCredentials {
                provider: PROVIDER_NAME.to_string(),
            })?;

        tracing::debug!(url = %url, model = %self.config.model, "sending generation request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                    retry_after: None,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!(
                    "HTTP {}: {}",
                    status,
                    &response_text[..response_text.len().min(200)]
                ),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: format!(
                    "JSON parse error: {}. Raw: {}",
                    e,
                    &response_text[..response_text.len().min(200)]
                ),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: "No choices in response".to_string(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    async fn generate(
        &self,
        system_context: &str,
        user_context: &str,
    ) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ApiMessage {
                    role: "system".to_string(),
                    content: system_context.to_string(),
                },
                ApiMessage {
                    role: "user".to_string(),
                    content: user_context.to_string(),
                },
            ],
            temperature: 0.2,
        };

        let mut attempt = 0u32;
        loop {
            match self.send_request(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = std::time::Duration::from_millis(250 * u64::from(attempt));
                    tracing::warn!(
                        error = %e,
                        attempt,
                        "generation request failed, retrying after {backoff:?}"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
