//! Shopping-search client for the Serper `/shopping` endpoint.

use async_trait::async_trait;
use grocer_core::ShoppingListing;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{check_status, endpoint, transport_error, HttpSettings, ShoppingSearch};
use crate::error::UpstreamError;
use crate::normalize::normalize_price;
use crate::retry::retry_with_backoff;

const SERVICE: &str = "shopping search";
const DEFAULT_BASE_URL: &str = "https://google.serper.dev";
const RESULT_LIMIT: u32 = 20;

#[derive(Debug, Serialize)]
struct ShoppingRequest<'a> {
    q: &'a str,
    gl: &'static str,
    hl: &'static str,
    num: u32,
}

#[derive(Debug, Deserialize)]
struct ShoppingResponse {
    #[serde(default)]
    shopping: Vec<ShoppingItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShoppingItem {
    #[serde(default)]
    title: String,
    link: Option<String>,
    image_url: Option<String>,
    rating: Option<f64>,
    rating_count: Option<u64>,
    price: Option<String>,
    source: Option<String>,
}

impl ShoppingItem {
    /// Listings without a link cannot enrich anything and are dropped.
    fn into_listing(self) -> Option<ShoppingListing> {
        let url = self.link.filter(|l| !l.trim().is_empty())?;
        Some(ShoppingListing {
            title: self.title,
            url,
            image_url: self.image_url,
            rating: self.rating,
            reviews_count: self.rating_count.and_then(|n| u32::try_from(n).ok()),
            price: self.price.as_deref().and_then(normalize_price),
            merchant: self.source,
        })
    }
}

/// Client for the Serper shopping search API.
pub struct SerperClient {
    client: Client,
    url: Url,
    api_key: String,
    settings: HttpSettings,
}

impl SerperClient {
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: &str, settings: &HttpSettings) -> Result<Self, UpstreamError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, settings)
    }

    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`UpstreamError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        settings: &HttpSettings,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: settings.build_client()?,
            url: endpoint(base_url, "shopping")?,
            api_key: api_key.to_owned(),
            settings: settings.clone(),
        })
    }

    async fn search_once(&self, query: &str) -> Result<Vec<ShoppingListing>, UpstreamError> {
        let request = ShoppingRequest {
            q: query,
            gl: "us",
            hl: "en",
            num: RESULT_LIMIT,
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("X-API-KEY", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, self.settings.timeout_secs, e))?;
        let response = check_status(SERVICE, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, self.settings.timeout_secs, e))?;
        let parsed: ShoppingResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
                context: format!("shopping results for {query:?}"),
                source: e,
            })?;

        Ok(parsed
            .shopping
            .into_iter()
            .filter_map(ShoppingItem::into_listing)
            .collect())
    }
}

#[async_trait]
impl ShoppingSearch for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<ShoppingListing>, UpstreamError> {
        let listings = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.search_once(query),
        )
        .await?;
        tracing::debug!(query, listings = listings.len(), "shopping search returned");
        Ok(listings)
    }
}
