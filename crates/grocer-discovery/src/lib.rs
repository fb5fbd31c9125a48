pub mod aggregate;
pub mod cache;
pub mod details;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod orchestrator;
pub mod parse;
mod parse_helpers;
pub mod prompts;
mod retry;
pub mod upstream;

pub use aggregate::group_offers;
pub use cache::{CacheEntry, CacheKey, Clock, DiscoveryCache, ManualClock, SystemClock};
pub use details::{parse_store_details, ParsedStoreDetails};
pub use error::{DiscoveryError, UpstreamError};
pub use matcher::{MatchCandidate, Matcher};
pub use orchestrator::{CacheSizes, Discovery, DiscoverySettings, MAX_AGGREGATE_STORES};
pub use parse::{parse_products, parse_stores, ParseOutcome};
pub use upstream::{AnswerEngine, HttpSettings, SerperClient, ShoppingSearch, SonarClient};
