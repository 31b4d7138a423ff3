//! HTTP client for Reddit's OAuth API.
//!
//! Every network call passes through the shared [`RateLimiter`], attaches a
//! bearer token from the shared [`TokenCache`], and is answered from the
//! [`KvCache`] when a fresh copy of the same response exists.

use std::sync::Arc;
use std::time::Duration;

use botscope_core::{AccountProfile, AppConfig};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::cache::KvCache;
use crate::error::CollectorError;
use crate::normalize::normalize_items;
use crate::rate_limit::RateLimiter;
use crate::source::{ActivitySource, CollectedActivity};
use crate::token::{Credentials, TokenCache};
use crate::types::{AboutResponse, Listing, ListingKind, RawThing};

const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";
const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const RATE_LIMIT_KEY: &str = "rate:reddit";

const PAGE_SIZE: usize = 100;
const PROFILE_TTL: Duration = Duration::from_secs(3600);
const LISTING_TTL: Duration = Duration::from_secs(300);

/// Connection settings for [`RedditClient`].
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Fixed delay before the single retry of a 429 response.
    pub retry_delay: Duration,
    pub qpm_limit: u64,
    pub credentials: Option<Credentials>,
}

impl CollectorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            user_agent: config.reddit_user_agent.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            qpm_limit: config.reddit_qpm_limit,
            credentials: Credentials::from_parts(
                config.reddit_client_id.as_deref(),
                config.reddit_client_secret.as_deref(),
            ),
        }
    }
}

pub struct RedditClient {
    http: Client,
    api_base_url: String,
    user_agent: String,
    retry_delay: Duration,
    limiter: Arc<RateLimiter>,
    tokens: Arc<TokenCache>,
    cache: Arc<dyn KvCache>,
}

impl RedditClient {
    /// Creates a client around existing shared components.
    ///
    /// Pass the same `limiter`, `tokens` and `cache` handles to every client
    /// in the process so quota and credentials are shared.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        config: &CollectorConfig,
        limiter: Arc<RateLimiter>,
        tokens: Arc<TokenCache>,
        cache: Arc<dyn KvCache>,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            http: build_http_client(config)?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            retry_delay: config.retry_delay,
            limiter,
            tokens,
            cache,
        })
    }

    /// Creates a client with its own limiter and token cache on top of `cache`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_config(
        config: &CollectorConfig,
        cache: Arc<dyn KvCache>,
    ) -> Result<Self, CollectorError> {
        let limiter = Arc::new(RateLimiter::new(
            Arc::clone(&cache),
            RATE_LIMIT_KEY,
            config.qpm_limit,
        ));
        let tokens = Arc::new(TokenCache::new(
            build_http_client(config)?,
            config.token_url.clone(),
            config.user_agent.clone(),
            config.credentials.clone(),
        ));
        Self::new(config, limiter, tokens, cache)
    }

    /// Performs only the token exchange, to verify configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::AuthConfiguration`] or
    /// [`CollectorError::AuthRequest`].
    pub async fn check_credentials(&self) -> Result<(), CollectorError> {
        self.tokens.get_token().await.map(|_| ())
    }

    /// Fetches creation time and karma counters for `username`.
    ///
    /// Served from the cache for up to an hour after a successful fetch.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] on auth failure, non-2xx status (after the
    /// single 429 retry), network failure or an unparseable body.
    pub async fn fetch_profile(&self, username: &str) -> Result<AccountProfile, CollectorError> {
        let cache_key = format!("reddit:profile:{username}");
        if let Some(cached) = self.cache_get(&cache_key) {
            match serde_json::from_value::<AccountProfile>(cached) {
                Ok(profile) => {
                    tracing::debug!(username, "profile served from cache");
                    return Ok(profile);
                }
                Err(e) => {
                    tracing::warn!(username, error = %e, "discarding unreadable cached profile");
                }
            }
        }

        let url = format!("{}/user/{username}/about", self.api_base_url);
        let payload = self.get_json(&url, &[]).await?;
        let about: AboutResponse =
            serde_json::from_value(payload).map_err(|e| CollectorError::Deserialize {
                context: url.clone(),
                source: e,
            })?;

        let profile = AccountProfile {
            username: username.to_string(),
            created_utc: about.data.created_utc,
            link_karma: about.data.link_karma,
            comment_karma: about.data.comment_karma,
        };
        if let Ok(value) = serde_json::to_value(&profile) {
            self.cache_set(&cache_key, &value, PROFILE_TTL);
        }
        Ok(profile)
    }

    /// Fetches up to `limit` records from one of the user's listings.
    ///
    /// Pages through the listing in batches of at most 100 using the `after`
    /// cursor. Each page is cached for five minutes under
    /// `(username, listing, cursor, batch)`. Stops when the server returns no
    /// items or no cursor; the result is truncated to exactly `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] for the first failing page; no partial
    /// listing is returned.
    pub async fn fetch_listing(
        &self,
        username: &str,
        listing: ListingKind,
        limit: usize,
    ) -> Result<Vec<RawThing>, CollectorError> {
        let mut items: Vec<RawThing> = Vec::new();
        let mut after: Option<String> = None;

        while items.len() < limit {
            let batch = PAGE_SIZE.min(limit - items.len());
            let cursor = after.as_deref().unwrap_or("None");
            let cache_key = format!("reddit:listing:{username}:{listing}:{cursor}:{batch}");

            let cached = self
                .cache_get(&cache_key)
                .and_then(|value| match serde_json::from_value::<Listing>(value) {
                    Ok(page) => Some(page),
                    Err(e) => {
                        tracing::warn!(username, %listing, cursor, error = %e, "discarding unreadable cached listing page");
                        None
                    }
                });

            let page = if let Some(page) = cached {
                tracing::debug!(username, %listing, cursor, "listing page served from cache");
                page
            } else {
                let url = format!("{}/user/{username}/{listing}", self.api_base_url);
                let mut params = vec![("limit", batch.to_string())];
                if let Some(cursor) = &after {
                    params.push(("after", cursor.clone()));
                }
                let fetched = self.get_json(&url, &params).await?;
                let page: Listing = serde_json::from_value(fetched.clone()).map_err(|e| {
                    CollectorError::Deserialize {
                        context: format!("{listing} listing for {username}"),
                        source: e,
                    }
                })?;
                self.cache_set(&cache_key, &fetched, LISTING_TTL);
                page
            };

            if page.data.children.is_empty() {
                break;
            }
            items.extend(page.data.children.into_iter().map(|thing| thing.data));

            after = page.data.after.filter(|a| !a.is_empty());
            if after.is_none() {
                break;
            }
        }

        items.truncate(limit);
        tracing::debug!(username, %listing, count = items.len(), "collected listing");
        Ok(items)
    }

    /// Collects the profile, `max_items / 2` submissions and the remainder as
    /// comments, then normalizes them.
    ///
    /// # Errors
    ///
    /// Propagates the first [`CollectorError`]; collection is all-or-nothing.
    pub async fn collect_user(
        &self,
        username: &str,
        max_items: usize,
    ) -> Result<CollectedActivity, CollectorError> {
        let profile = self.fetch_profile(username).await?;

        let submission_limit = max_items / 2;
        let comment_limit = max_items - submission_limit;
        let submissions = self
            .fetch_listing(username, ListingKind::Submitted, submission_limit)
            .await?;
        let comments = self
            .fetch_listing(username, ListingKind::Comments, comment_limit)
            .await?;

        tracing::info!(
            username,
            submissions = submissions.len(),
            comments = comments.len(),
            "collected Reddit activity"
        );

        Ok(CollectedActivity {
            profile,
            items: normalize_items(&submissions, &comments),
        })
    }

    /// Rate-limited, authenticated GET with exactly one delayed retry on 429.
    /// The retry takes its own limiter slot.
    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, CollectorError> {
        self.limiter.acquire().await;
        let token = self.tokens.get_token().await?;

        let mut response = self.send(url, params, &token).await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(
                url,
                delay_ms = u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX),
                "rate limited by Reddit; retrying once after fixed delay"
            );
            tokio::time::sleep(self.retry_delay).await;
            self.limiter.acquire().await;
            response = self.send(url, params, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::Collection {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        self.observe_quota(response.headers());
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CollectorError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&str, String)],
        token: &str,
    ) -> Result<reqwest::Response, CollectorError> {
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("bearer {token}"))
            .header("User-Agent", &self.user_agent)
            .query(params)
            .send()
            .await?;
        Ok(response)
    }

    fn observe_quota(&self, headers: &HeaderMap) {
        let read = |name: &str| -> Option<f64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
        };
        if let (Some(remaining), Some(reset)) =
            (read("x-ratelimit-remaining"), read("x-ratelimit-reset"))
        {
            self.limiter.observe_quota(remaining, reset);
        }
    }

    fn cache_get(&self, key: &str) -> Option<Value> {
        match self.cache.get_json(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "response cache unavailable; fetching");
                None
            }
        }
    }

    fn cache_set(&self, key: &str, value: &Value, ttl: Duration) {
        if let Err(e) = self.cache.set_json(key, value, ttl) {
            tracing::warn!(key, error = %e, "response cache unavailable; not caching");
        }
    }
}

impl ActivitySource for RedditClient {
    async fn collect(
        &self,
        username: &str,
        max_items: usize,
    ) -> Result<CollectedActivity, CollectorError> {
        self.collect_user(username, max_items).await
    }
}

fn build_http_client(config: &CollectorConfig) -> Result<Client, CollectorError> {
    let client = Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_app_config_maps_reddit_settings() {
        let app = AppConfig {
            database_url: None,
            log_level: "info".to_string(),
            reddit_client_id: Some("id".to_string()),
            reddit_client_secret: Some("secret".to_string()),
            reddit_user_agent: "ua/1.0".to_string(),
            reddit_max_items: 200,
            reddit_qpm_limit: 60,
            request_timeout_secs: 12,
            retry_delay_secs: 3,
            collector_version: "v0.1".to_string(),
            cache_hours: 6,
            worker_count: 2,
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
        };
        let cfg = CollectorConfig::from_app_config(&app);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(cfg.user_agent, "ua/1.0");
        assert_eq!(cfg.request_timeout, Duration::from_secs(12));
        assert_eq!(cfg.retry_delay, Duration::from_secs(3));
        assert_eq!(cfg.qpm_limit, 60);
        assert!(cfg.credentials.is_some());
    }
}
