//! Answer-engine client for the Perplexity Sonar chat-completions API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{check_status, endpoint, transport_error, AnswerEngine, HttpSettings};
use crate::error::UpstreamError;
use crate::prompts::SYSTEM_PROMPT;
use crate::retry::retry_with_backoff;

const SERVICE: &str = "answer engine";
const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the Sonar `chat/completions` endpoint.
///
/// Use [`SonarClient::new`] for production or [`SonarClient::with_base_url`]
/// to point at a mock server in tests.
pub struct SonarClient {
    client: Client,
    url: Url,
    api_key: String,
    model: String,
    settings: HttpSettings,
}

impl SonarClient {
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: &str, model: &str, settings: &HttpSettings) -> Result<Self, UpstreamError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model, settings)
    }

    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`UpstreamError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        model: &str,
        settings: &HttpSettings,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: settings.build_client()?,
            url: endpoint(base_url, "chat/completions")?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            settings: settings.clone(),
        })
    }

    async fn ask_once(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, self.settings.timeout_secs, e))?;
        let response = check_status(SERVICE, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, self.settings.timeout_secs, e))?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
                context: "chat completion".to_owned(),
                source: e,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(UpstreamError::EmptyReply { service: SERVICE })
    }
}

#[async_trait]
impl AnswerEngine for SonarClient {
    async fn ask(&self, prompt: &str) -> Result<String, UpstreamError> {
        let reply = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.ask_once(prompt),
        )
        .await?;
        tracing::debug!(model = %self.model, chars = reply.len(), "answer engine replied");
        Ok(reply)
    }
}
