//! Shared domain types and configuration for the grocery discovery service.

pub mod app_config;
pub mod config;
pub mod records;
pub mod tuning;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    Availability, CanonicalProduct, ProductAggregate, ProductGroup, ProductOffer, ProductRecord,
    ProductSearch, ServiceTag, ShoppingListing, Source, StoreDetails, StoreDiscovery,
    StoreLocation, StoreRecord, StoreStatus, Weekday,
};
pub use tuning::{load_tuning, ServiceSynonyms, Tuning, TuningFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tuning file {path}: {source}")]
    TuningFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tuning file: {0}")]
    TuningFileParse(#[source] serde_yaml::Error),

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
}
