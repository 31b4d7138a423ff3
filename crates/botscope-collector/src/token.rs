//! Client-credentials OAuth token shared across collection runs.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::CollectorError;
use crate::types::TokenResponse;

const DEFAULT_EXPIRES_IN_SECS: f64 = 3600.0;
const EXPIRY_MARGIN_SECS: f64 = 60.0;

/// Long-lived client id/secret pair exchanged for short-lived tokens.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns `None` unless both halves are present and non-blank.
    #[must_use]
    pub fn from_parts(client_id: Option<&str>, client_secret: Option<&str>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty() => {
                Some(Self::new(id, secret))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"[redacted]")
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Holds the current bearer token and refreshes it on expiry.
///
/// The token slot is an async mutex held across the exchange, so concurrent
/// callers that find the token expired queue behind a single in-flight
/// refresh and then reuse its result.
pub struct TokenCache {
    http: Client,
    token_url: String,
    user_agent: String,
    credentials: Option<Credentials>,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    #[must_use]
    pub fn new(
        http: Client,
        token_url: impl Into<String>,
        user_agent: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            user_agent: user_agent.into(),
            credentials,
            slot: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, exchanging credentials when the cached
    /// one is missing or expired.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::AuthConfiguration`] if no credentials are configured.
    /// - [`CollectorError::AuthRequest`] if the exchange fails or returns a
    ///   non-2xx status.
    pub async fn get_token(&self) -> Result<String, CollectorError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(CollectorError::AuthConfiguration)?;

        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.exchange(credentials).await?;
        let token = fresh.access_token.clone();
        *slot = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<CachedToken, CollectorError> {
        tracing::debug!(url = %self.token_url, "exchanging client credentials for access token");

        let response = self
            .http
            .post(&self.token_url)
            .header("User-Agent", &self.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CollectorError::AuthRequest(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CollectorError::AuthRequest(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CollectorError::AuthRequest(format!("token parse error: {e}")))?;

        let expires_in = body
            .expires_in
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = Duration::from_secs_f64((expires_in - EXPIRY_MARGIN_SECS).max(0.0));

        tracing::info!(expires_in, "obtained Reddit access token");
        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
