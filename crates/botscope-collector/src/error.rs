use thiserror::Error;

/// Errors that abort a collection run.
///
/// Cache failures never appear here: they are recovered locally by
/// bypassing the cache (see [`crate::cache::CacheUnavailable`]).
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Client id or secret is not configured. Not retried.
    #[error("Reddit client credentials are not configured (set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET)")]
    AuthConfiguration,

    /// The client-credentials exchange failed or returned a non-2xx status.
    #[error("Reddit token exchange failed: {0}")]
    AuthRequest(String),

    /// Non-2xx response after the single 429 retry.
    #[error("Reddit returned HTTP {status} for {url}")]
    Collection { status: u16, url: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
