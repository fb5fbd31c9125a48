use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub answer_engine_api_key: String,
    pub answer_engine_url: String,
    pub answer_engine_model: String,
    /// Absent key disables listing enrichment entirely.
    pub shopping_search_api_key: Option<String>,
    pub shopping_search_url: String,
    pub user_agent: String,
    pub upstream_timeout_secs: u64,
    pub upstream_max_retries: u32,
    pub upstream_backoff_base_ms: u64,
    pub store_cache_ttl_secs: u64,
    pub product_cache_ttl_secs: u64,
    pub tuning_path: Option<PathBuf>,
}

impl AppConfig {
    /// Returns `true` when a shopping-search key is configured.
    #[must_use]
    pub fn enrichment_enabled(&self) -> bool {
        self.shopping_search_api_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("answer_engine_api_key", &"[redacted]")
            .field("answer_engine_url", &self.answer_engine_url)
            .field("answer_engine_model", &self.answer_engine_model)
            .field(
                "shopping_search_api_key",
                &self.shopping_search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("shopping_search_url", &self.shopping_search_url)
            .field("user_agent", &self.user_agent)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("upstream_max_retries", &self.upstream_max_retries)
            .field("upstream_backoff_base_ms", &self.upstream_backoff_base_ms)
            .field("store_cache_ttl_secs", &self.store_cache_ttl_secs)
            .field("product_cache_ttl_secs", &self.product_cache_ttl_secs)
            .field("tuning_path", &self.tuning_path)
            .finish()
    }
}
