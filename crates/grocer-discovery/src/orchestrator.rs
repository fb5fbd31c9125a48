//! Request pipeline for store discovery and product search.
//!
//! ```text
//! cache check ─hit──────────────────────────────────────────────▶ done
//!      └─miss─▶ answer engine ─▶ parse ─▶ [shopping search ─▶ match] ─▶ cache write ─▶ done
//! ```
//!
//! The answer engine is required: its failure fails the request. Shopping
//! search is optional and best-effort; when it is missing, slow, or failing
//! the parsed products are returned without enrichment.
//!
//! Store details follow the same path without the shopping step. An
//! aggregate search runs one product search per store, at most
//! [`MAX_AGGREGATE_STORES`] at a time, and groups the results.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use grocer_core::{
    AppConfig, ProductAggregate, ProductRecord, ProductSearch, Source, StoreDetails,
    StoreDiscovery, Tuning,
};

use crate::aggregate::group_offers;
use crate::cache::{CacheKey, Clock, DiscoveryCache, SystemClock};
use crate::details::parse_store_details;
use crate::error::{DiscoveryError, UpstreamError};
use crate::matcher::Matcher;
use crate::normalize::{clean_text, slugify};
use crate::parse::{parse_products, parse_stores};
use crate::prompts::{product_prompt, store_details_prompt, store_prompt};
use crate::upstream::{AnswerEngine, HttpSettings, SerperClient, ShoppingSearch, SonarClient};

/// Upper bound on stores searched by one aggregate request, which is also
/// the number of searches in flight at once.
pub const MAX_AGGREGATE_STORES: usize = 10;

/// Timing and matching knobs for [`Discovery`].
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Upper bound on each upstream call, enforced around the client.
    pub upstream_timeout: Duration,
    pub store_cache_ttl: Duration,
    pub product_cache_ttl: Duration,
    pub tuning: Tuning,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_secs(30),
            store_cache_ttl: Duration::from_secs(24 * 60 * 60),
            product_cache_ttl: Duration::from_secs(4 * 60 * 60),
            tuning: Tuning::default(),
        }
    }
}

impl DiscoverySettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, tuning: Tuning) -> Self {
        Self {
            upstream_timeout: Duration::from_secs(config.upstream_timeout_secs),
            store_cache_ttl: Duration::from_secs(config.store_cache_ttl_secs),
            product_cache_ttl: Duration::from_secs(config.product_cache_ttl_secs),
            tuning,
        }
    }
}

/// Entry counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheSizes {
    pub stores: usize,
    pub products: usize,
    pub store_details: usize,
    pub aggregates: usize,
}

/// What happened to the enrichment step of one product search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnrichmentOutcome {
    NotConfigured,
    NothingToEnrich,
    Unavailable,
    Matched(usize),
}

impl EnrichmentOutcome {
    fn as_str(self) -> &'static str {
        match self {
            EnrichmentOutcome::NotConfigured => "not_configured",
            EnrichmentOutcome::NothingToEnrich => "nothing_to_enrich",
            EnrichmentOutcome::Unavailable => "unavailable",
            EnrichmentOutcome::Matched(_) => "matched",
        }
    }

    fn enriched(self) -> usize {
        match self {
            EnrichmentOutcome::Matched(n) => n,
            _ => 0,
        }
    }

    fn source(self) -> Source {
        if self.enriched() > 0 {
            Source::AnswerEngineWithEnrichment
        } else {
            Source::AnswerEngine
        }
    }
}

/// Coordinates the answer engine, shopping search, matcher, and caches.
pub struct Discovery {
    answer_engine: Arc<dyn AnswerEngine>,
    shopping: Option<Arc<dyn ShoppingSearch>>,
    matcher: Matcher,
    tuning: Tuning,
    upstream_timeout: Duration,
    clock: Arc<dyn Clock>,
    store_cache: DiscoveryCache<StoreDiscovery>,
    product_cache: DiscoveryCache<ProductSearch>,
    details_cache: DiscoveryCache<StoreDetails>,
    aggregate_cache: DiscoveryCache<ProductAggregate>,
}

impl Discovery {
    #[must_use]
    pub fn new(
        answer_engine: Arc<dyn AnswerEngine>,
        shopping: Option<Arc<dyn ShoppingSearch>>,
        settings: DiscoverySettings,
    ) -> Self {
        Self::with_clock(answer_engine, shopping, settings, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        answer_engine: Arc<dyn AnswerEngine>,
        shopping: Option<Arc<dyn ShoppingSearch>>,
        settings: DiscoverySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            answer_engine,
            shopping,
            matcher: Matcher::from_tuning(&settings.tuning),
            tuning: settings.tuning,
            upstream_timeout: settings.upstream_timeout,
            store_cache: DiscoveryCache::new(settings.store_cache_ttl, Arc::clone(&clock)),
            product_cache: DiscoveryCache::new(settings.product_cache_ttl, Arc::clone(&clock)),
            details_cache: DiscoveryCache::new(settings.store_cache_ttl, Arc::clone(&clock)),
            aggregate_cache: DiscoveryCache::new(settings.product_cache_ttl, Arc::clone(&clock)),
            clock,
        }
    }

    /// Builds the HTTP clients from configuration. Enrichment is enabled
    /// only when a shopping-search key is present.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Client`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, tuning: Tuning) -> Result<Self, DiscoveryError> {
        let http = HttpSettings::from_config(config);
        let answer_engine = SonarClient::with_base_url(
            &config.answer_engine_url,
            &config.answer_engine_api_key,
            &config.answer_engine_model,
            &http,
        )
        .map_err(DiscoveryError::Client)?;

        let shopping: Option<Arc<dyn ShoppingSearch>> = match &config.shopping_search_api_key {
            Some(key) => Some(Arc::new(
                SerperClient::with_base_url(&config.shopping_search_url, key, &http)
                    .map_err(DiscoveryError::Client)?,
            )),
            None => {
                tracing::info!("SERPER_API_KEY not set; product enrichment disabled");
                None
            }
        };

        Ok(Self::new(
            Arc::new(answer_engine),
            shopping,
            DiscoverySettings::from_config(config, tuning),
        ))
    }

    #[must_use]
    pub fn enrichment_enabled(&self) -> bool {
        self.shopping.is_some()
    }

    #[must_use]
    pub fn cache_sizes(&self) -> CacheSizes {
        CacheSizes {
            stores: self.store_cache.len(),
            products: self.product_cache.len(),
            store_details: self.details_cache.len(),
            aggregates: self.aggregate_cache.len(),
        }
    }

    /// Finds grocery stores near `location`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UpstreamUnavailable`] if the answer engine
    /// fails or does not reply within the upstream timeout.
    pub async fn discover_stores(&self, location: &str) -> Result<StoreDiscovery, DiscoveryError> {
        let key = CacheKey::stores(location);
        if let Some(mut hit) = self.store_cache.get(&key) {
            tracing::info!(location, stores = hit.stores_found, "store discovery cache hit");
            hit.cached = true;
            return Ok(hit);
        }
        tracing::debug!(location, "store discovery cache miss");

        let reply = self
            .ask_answer_engine(&store_prompt(location))
            .await
            .map_err(|source| {
                tracing::error!(location, error = %source, "store discovery failed");
                DiscoveryError::UpstreamUnavailable { source }
            })?;

        let outcome = parse_stores(&reply, location, &self.tuning.service_synonyms);
        let strategy = outcome.strategy();
        let stores = outcome.into_records();
        tracing::info!(location, strategy, stores = stores.len(), "parsed store listing");

        let result = StoreDiscovery {
            location: location.to_owned(),
            stores_found: stores.len(),
            stores,
            source: Source::AnswerEngine,
            search_timestamp: self.clock.now(),
            cached: false,
        };
        self.store_cache.put(key, result.clone());
        Ok(result)
    }

    /// Finds products matching `query` at `store_name` in `location`, then
    /// enriches them from shopping search when available.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UpstreamUnavailable`] if the answer engine
    /// fails or times out. Shopping-search failures never produce an error.
    pub async fn search_products(
        &self,
        query: &str,
        store_name: &str,
        location: &str,
    ) -> Result<ProductSearch, DiscoveryError> {
        let key = CacheKey::products(query, store_name, location);
        if let Some(mut hit) = self.product_cache.get(&key) {
            tracing::info!(query, store_name, location, "product search cache hit");
            hit.cached = true;
            return Ok(hit);
        }
        tracing::debug!(query, store_name, location, "product search cache miss");

        let reply = self
            .ask_answer_engine(&product_prompt(query, store_name, location))
            .await
            .map_err(|source| {
                tracing::error!(query, store_name, error = %source, "product search failed");
                DiscoveryError::UpstreamUnavailable { source }
            })?;

        let outcome = parse_products(&reply);
        let strategy = outcome.strategy();
        let mut products = outcome.into_records();
        tracing::info!(
            query,
            store_name,
            strategy,
            products = products.len(),
            "parsed product listing"
        );

        let enrichment = self.enrich(query, store_name, &mut products).await;
        tracing::info!(
            query,
            store_name,
            enrichment = enrichment.as_str(),
            enriched = enrichment.enriched(),
            "enrichment finished"
        );

        let result = ProductSearch {
            query: query.to_owned(),
            store_name: store_name.to_owned(),
            location: location.to_owned(),
            products_found: products.len(),
            products,
            search_timestamp: self.clock.now(),
            source: enrichment.source(),
            cached: false,
        };
        self.product_cache.put(key, result.clone());
        Ok(result)
    }

    /// Looks up contact details, opening hours, and amenities of one store.
    ///
    /// A reply with nothing recognizable still succeeds, with every field
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UpstreamUnavailable`] if the answer engine
    /// fails or times out.
    pub async fn store_details(
        &self,
        store_name: &str,
        location: &str,
    ) -> Result<StoreDetails, DiscoveryError> {
        let key = CacheKey::store_details(store_name, location);
        if let Some(mut hit) = self.details_cache.get(&key) {
            tracing::info!(store_name, location, "store details cache hit");
            hit.cached = true;
            return Ok(hit);
        }
        tracing::debug!(store_name, location, "store details cache miss");

        let reply = self
            .ask_answer_engine(&store_details_prompt(store_name, location))
            .await
            .map_err(|source| {
                tracing::error!(store_name, location, error = %source, "store details failed");
                DiscoveryError::UpstreamUnavailable { source }
            })?;

        let parsed = parse_store_details(&reply, &self.tuning.service_synonyms);
        if parsed.is_empty() {
            tracing::warn!(store_name, location, "store details reply had no usable fields");
        }
        tracing::info!(
            store_name,
            location,
            days = parsed.hours.len(),
            services = parsed.services.len(),
            features = parsed.features.len(),
            "parsed store details"
        );

        let result = StoreDetails {
            store_name: store_name.to_owned(),
            location: location.to_owned(),
            address: parsed.address,
            phone: parsed.phone,
            website: parsed.website,
            hours: parsed.hours,
            services: parsed.services,
            features: parsed.features,
            source: Source::AnswerEngine,
            search_timestamp: self.clock.now(),
            cached: false,
        };
        self.details_cache.put(key, result.clone());
        Ok(result)
    }

    /// Searches `query` at several stores and groups the listings by
    /// product.
    ///
    /// `stores` is de-duplicated by slug and cut to
    /// [`MAX_AGGREGATE_STORES`]; when it is empty the stores discovered near
    /// `location` are used. A store whose search fails is reported in
    /// `stores_failed` and the rest still count. Only results without
    /// failures are cached.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UpstreamUnavailable`] if store discovery is
    /// needed and fails, or if every store search fails.
    pub async fn aggregate_products(
        &self,
        query: &str,
        location: &str,
        stores: &[String],
    ) -> Result<ProductAggregate, DiscoveryError> {
        let mut considered = limit_stores(stores.iter().map(String::as_str));
        if considered.is_empty() {
            let discovered = self.discover_stores(location).await?;
            considered = limit_stores(discovered.stores.iter().map(|s| s.name.as_str()));
        }

        let key = CacheKey::aggregate(query, location, &considered);
        if let Some(mut hit) = self.aggregate_cache.get(&key) {
            tracing::info!(query, location, groups = hit.groups_found, "aggregate cache hit");
            hit.cached = true;
            return Ok(hit);
        }
        tracing::debug!(query, location, stores = considered.len(), "aggregate cache miss");

        let searches_pending: Vec<_> = considered
            .iter()
            .map(|store| async move {
                (store, self.search_products(query, store, location).await)
            })
            .collect();
        let outcomes: Vec<(&String, Result<ProductSearch, DiscoveryError>)> =
            stream::iter(searches_pending)
                .buffered(MAX_AGGREGATE_STORES)
                .collect()
                .await;

        let mut searches = Vec::with_capacity(outcomes.len());
        let mut stores_failed = Vec::new();
        let mut first_error = None;
        for (store, outcome) in outcomes {
            match outcome {
                Ok(search) => searches.push(search),
                Err(err) => {
                    tracing::warn!(query, store = %store, error = %err, "store search failed, skipping");
                    stores_failed.push(store.clone());
                    first_error.get_or_insert(err);
                }
            }
        }
        if searches.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        let results = group_offers(&searches);
        tracing::info!(
            query,
            location,
            stores = considered.len(),
            failed = stores_failed.len(),
            groups = results.len(),
            "aggregate search finished"
        );

        let result = ProductAggregate {
            query: query.to_owned(),
            location: location.to_owned(),
            stores_considered: considered,
            groups_found: results.len(),
            stores_failed,
            results,
            search_timestamp: self.clock.now(),
            cached: false,
        };
        if result.stores_failed.is_empty() {
            self.aggregate_cache.put(key, result.clone());
        }
        Ok(result)
    }

    async fn ask_answer_engine(&self, prompt: &str) -> Result<String, UpstreamError> {
        with_timeout(
            "answer engine",
            self.upstream_timeout,
            self.answer_engine.ask(prompt),
        )
        .await
    }

    async fn enrich(
        &self,
        query: &str,
        store_name: &str,
        products: &mut [ProductRecord],
    ) -> EnrichmentOutcome {
        let Some(shopping) = &self.shopping else {
            return EnrichmentOutcome::NotConfigured;
        };
        if products.is_empty() {
            return EnrichmentOutcome::NothingToEnrich;
        }

        let search_query = format!("{query} {store_name}");
        let listings = match with_timeout(
            "shopping search",
            self.upstream_timeout,
            shopping.search(&search_query),
        )
        .await
        {
            Ok(listings) => listings,
            Err(err) => {
                tracing::warn!(
                    query = %search_query,
                    error = %err,
                    "shopping search unavailable, returning products without enrichment"
                );
                return EnrichmentOutcome::Unavailable;
            }
        };

        EnrichmentOutcome::Matched(self.matcher.enrich(products, &listings))
    }
}

/// Cleans store names, drops blanks and names with an already-seen slug, and
/// keeps at most [`MAX_AGGREGATE_STORES`].
fn limit_stores<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut kept = Vec::new();
    for name in names.filter_map(clean_text) {
        let slug = slugify(&name);
        if seen.contains(&slug) {
            continue;
        }
        seen.push(slug);
        kept.push(name);
        if kept.len() == MAX_AGGREGATE_STORES {
            break;
        }
    }
    kept
}

async fn with_timeout<T, F>(
    service: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout {
            service,
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
