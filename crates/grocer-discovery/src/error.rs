use thiserror::Error;

/// Failure talking to one of the upstream services.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} rejected the API key")]
    Unauthorized { service: &'static str },

    #[error("rate limited by {service} (retry after {retry_after_secs}s)")]
    RateLimited {
        service: &'static str,
        retry_after_secs: u64,
    },

    #[error("{service} rejected the request: {message}")]
    BadRequest {
        service: &'static str,
        message: String,
    },

    #[error("unexpected HTTP status {status} from {service}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} returned an empty reply")]
    EmptyReply { service: &'static str },

    #[error("{service} did not respond within {after_ms}ms")]
    Timeout { service: &'static str, after_ms: u64 },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Failure of a discovery request as a whole.
///
/// Enrichment failures never surface here; they degrade the response instead.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The answer engine failed or timed out. The message is safe to show
    /// to API callers; the upstream detail stays in `source`.
    #[error("answer engine unavailable")]
    UpstreamUnavailable {
        #[source]
        source: UpstreamError,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[source] UpstreamError),
}
