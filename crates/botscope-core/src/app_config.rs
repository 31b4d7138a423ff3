#[derive(Clone)]
pub struct AppConfig {
    /// `None` runs the pipeline against the in-memory store.
    pub database_url: Option<String>,
    pub log_level: String,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub reddit_max_items: usize,
    pub reddit_qpm_limit: u64,
    pub request_timeout_secs: u64,
    pub retry_delay_secs: u64,
    pub collector_version: String,
    pub cache_hours: u64,
    pub worker_count: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_id",
                &self.reddit_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_secret",
                &self.reddit_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("reddit_max_items", &self.reddit_max_items)
            .field("reddit_qpm_limit", &self.reddit_qpm_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("collector_version", &self.collector_version)
            .field("cache_hours", &self.cache_hours)
            .field("worker_count", &self.worker_count)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
