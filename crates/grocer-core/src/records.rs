use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fulfilment option offered by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTag {
    Delivery,
    Pickup,
    Curbside,
    InStore,
}

impl ServiceTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceTag::Delivery => "delivery",
            ServiceTag::Pickup => "pickup",
            ServiceTag::Curbside => "curbside",
            ServiceTag::InStore => "in_store",
        }
    }
}

impl std::fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub city: Option<String>,
    /// Two-letter state code, e.g. `"IL"`.
    pub state: Option<String>,
    pub zipcode: Option<String>,
}

/// A grocery store extracted from an answer-engine response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Slug derived from `name`; unique within one response.
    pub store_id: String,
    pub name: String,
    pub address: Option<String>,
    /// Ordered, duplicate-free.
    pub services: Vec<ServiceTag>,
    pub status: StoreStatus,
    pub website: Option<String>,
    /// Formatted as `XXX-XXX-XXXX`.
    pub phone: Option<String>,
    /// Opening hours as written, e.g. `"Daily 7 AM - 10 PM"`.
    pub hours: Option<String>,
    pub location: StoreLocation,
}

/// A product extracted from an answer-engine response, optionally enriched
/// from a matched shopping listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub brand: Option<String>,
    /// Serialized as a decimal string, e.g. `"9.19"`.
    pub price: Option<Decimal>,
    /// Size exactly as written in the source text, e.g. `"64 oz"`.
    pub size: Option<String>,
    pub category: Option<String>,
    pub availability: Availability,
    pub description: Option<String>,
    pub deals: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    /// Within `0.0..=5.0` when present.
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
}

impl ProductRecord {
    /// Returns `true` once a shopping listing has been applied.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.product_url.is_some()
    }
}

/// One result row from the shopping-search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListing {
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub price: Option<Decimal>,
    pub merchant: Option<String>,
}

/// Which upstream services contributed to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "answer_engine")]
    AnswerEngine,
    #[serde(rename = "answer_engine + enrichment_engine")]
    AnswerEngineWithEnrichment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDiscovery {
    pub location: String,
    pub stores_found: usize,
    pub stores: Vec<StoreRecord>,
    pub source: Source,
    pub search_timestamp: DateTime<Utc>,
    pub cached: bool,
}

impl StoreDiscovery {
    /// Keeps only stores whose `store_id` is in `ids`, updating the count.
    #[must_use]
    pub fn retain_store_ids(mut self, ids: &[String]) -> Self {
        self.stores.retain(|s| ids.iter().any(|id| id == &s.store_id));
        self.stores_found = self.stores.len();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

/// Contact, hours, and amenities for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDetails {
    pub store_name: String,
    pub location: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// Keyed by day; serialized Monday first.
    pub hours: BTreeMap<Weekday, String>,
    pub services: Vec<ServiceTag>,
    /// Lowercase amenity names such as `"pharmacy"` or `"bakery"`.
    pub features: Vec<String>,
    pub source: Source,
    pub search_timestamp: DateTime<Utc>,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSearch {
    pub query: String,
    pub store_name: String,
    pub location: String,
    pub products_found: usize,
    pub products: Vec<ProductRecord>,
    pub search_timestamp: DateTime<Utc>,
    pub source: Source,
    pub cached: bool,
}

/// The shared identity of offers grouped across stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub name: String,
    pub brand: Option<String>,
    pub size: Option<String>,
    /// Distinct image URLs from the grouped offers, in order seen.
    pub images: Vec<String>,
}

/// One store's listing of a canonical product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOffer {
    pub store_id: String,
    pub store_name: String,
    pub price: Option<Decimal>,
    pub availability: Availability,
    pub product_url: Option<String>,
    pub rating: Option<f64>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub product: CanonicalProduct,
    pub offers: Vec<ProductOffer>,
}

/// Product search across several stores, grouped by product identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAggregate {
    pub query: String,
    pub location: String,
    /// Store names searched, in request order.
    pub stores_considered: Vec<String>,
    /// Stores whose search failed; their offers are missing from `results`.
    pub stores_failed: Vec<String>,
    pub groups_found: usize,
    pub results: Vec<ProductGroup>,
    pub search_timestamp: DateTime<Utc>,
    pub cached: bool,
}
