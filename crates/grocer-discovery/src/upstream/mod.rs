//! Collaborator contracts for the two upstream services and their HTTP
//! implementations.
//!
//! The orchestrator only sees the traits, so tests substitute in-process
//! fakes and the binaries plug in [`SonarClient`] and [`SerperClient`].

mod serper;
mod sonar;

use std::time::Duration;

use async_trait::async_trait;
use grocer_core::{AppConfig, ShoppingListing};
use reqwest::{Client, Response, StatusCode, Url};

use crate::error::UpstreamError;

pub use serper::SerperClient;
pub use sonar::SonarClient;

/// Answers a free-text research prompt.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    /// Returns the engine's reply text for `prompt`.
    async fn ask(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// Looks up shopping listings for a query.
#[async_trait]
pub trait ShoppingSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ShoppingListing>, UpstreamError>;
}

/// Transport settings shared by both HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "grocer/0.1 (grocery-discovery)".to_owned(),
            max_retries: 1,
            backoff_base_ms: 500,
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.upstream_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.upstream_max_retries,
            backoff_base_ms: config.upstream_backoff_base_ms,
        }
    }

    fn build_client(&self) -> Result<Client, UpstreamError> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent)
            .build()?)
    }
}

/// Joins `path` onto `base_url`, tolerating a trailing slash on the base.
fn endpoint(base_url: &str, path: &str) -> Result<Url, UpstreamError> {
    let joined = format!("{}/{path}", base_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| UpstreamError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Maps a transport failure, separating client-side timeouts so they are
/// never retried.
fn transport_error(service: &'static str, timeout_secs: u64, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout {
            service,
            after_ms: timeout_secs.saturating_mul(1000),
        }
    } else {
        UpstreamError::Http(err)
    }
}

/// Turns a non-success response into the matching [`UpstreamError`].
async fn check_status(service: &'static str, response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(UpstreamError::Unauthorized { service })
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            Err(UpstreamError::RateLimited {
                service,
                retry_after_secs,
            })
        }
        StatusCode::BAD_REQUEST => {
            let mut message = response.text().await.unwrap_or_default();
            // Cap at 200 bytes on a char boundary.
            if message.len() > 200 {
                let cut = (0..=200).rev().find(|&i| message.is_char_boundary(i)).unwrap_or(0);
                message.truncate(cut);
            }
            Err(UpstreamError::BadRequest { service, message })
        }
        _ => Err(UpstreamError::UnexpectedStatus {
            service,
            status: status.as_u16(),
        }),
    }
}
