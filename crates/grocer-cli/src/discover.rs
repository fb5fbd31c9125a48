//! Command handlers for `stores`, `products`, `details`, and `aggregate`.
//!
//! Each handler runs one discovery request and renders the result as JSON.
//! Upstream failures are returned as errors so the process exits non-zero.

use grocer_core::{AppConfig, Tuning};
use grocer_discovery::Discovery;
use serde::Serialize;

/// Builds the discovery pipeline from configuration, loading the tuning
/// file when one is configured.
pub(crate) fn build_discovery(config: &AppConfig) -> anyhow::Result<Discovery> {
    let tuning = match &config.tuning_path {
        Some(path) => grocer_core::load_tuning(path)?,
        None => Tuning::default(),
    };
    Ok(Discovery::from_config(config, tuning)?)
}

pub(crate) fn render<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<String> {
    Ok(if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    })
}

/// Discover stores near `location`, optionally keeping only `chains`.
///
/// # Errors
///
/// Returns an error if the answer engine is unavailable.
pub(crate) async fn run_stores(
    discovery: &Discovery,
    location: &str,
    chains: &[String],
    compact: bool,
) -> anyhow::Result<String> {
    let mut result = discovery.discover_stores(location).await?;
    let chains: Vec<String> = chains
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    if !chains.is_empty() {
        result = result.retain_store_ids(&chains);
    }
    tracing::info!(location, stores = result.stores_found, "store discovery complete");
    render(&result, compact)
}

/// Search `store_name` in `location` for products matching `query`.
///
/// # Errors
///
/// Returns an error if the answer engine is unavailable.
pub(crate) async fn run_products(
    discovery: &Discovery,
    query: &str,
    store_name: &str,
    location: &str,
    compact: bool,
) -> anyhow::Result<String> {
    let result = discovery.search_products(query, store_name, location).await?;
    tracing::info!(
        query,
        store_name,
        products = result.products_found,
        "product search complete"
    );
    render(&result, compact)
}

/// Look up the details of `store_name` in `location`.
///
/// # Errors
///
/// Returns an error if the answer engine is unavailable.
pub(crate) async fn run_details(
    discovery: &Discovery,
    store_name: &str,
    location: &str,
    compact: bool,
) -> anyhow::Result<String> {
    let result = discovery.store_details(store_name, location).await?;
    tracing::info!(
        store_name,
        location,
        days = result.hours.len(),
        "store details complete"
    );
    render(&result, compact)
}

/// Search `query` across `stores` (or the stores near `location`) and group
/// the offers by product.
///
/// # Errors
///
/// Returns an error if store discovery or every store search fails.
pub(crate) async fn run_aggregate(
    discovery: &Discovery,
    query: &str,
    location: &str,
    stores: &[String],
    compact: bool,
) -> anyhow::Result<String> {
    let result = discovery.aggregate_products(query, location, stores).await?;
    if !result.stores_failed.is_empty() {
        tracing::warn!(failed = ?result.stores_failed, "some stores could not be searched");
    }
    tracing::info!(
        query,
        location,
        groups = result.groups_found,
        "aggregate search complete"
    );
    render(&result, compact)
}
