//! Access token acquisition
//!
//! Every gateway call needs a bearer token from `oauth/v1/generate`. By default a
//! fresh token is requested for each operation; [`MpesaConfig::cache_tokens`]
//! switches on reuse until shortly before the token's advertised expiry.

use crate::config::MpesaConfig;
use crate::types::AuthResponse;
use crate::{MpesaError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::header::{AUTHORIZATION, CACHE_CONTROL};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Token endpoint, relative to the base URL
pub const AUTH_PATH: &str = "oauth/v1/generate?grant_type=client_credentials";

/// Lifetime assumed when the gateway omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3599);
/// Cached tokens are dropped this long before they actually expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Base64 of `key:secret` for the `Basic` authorization scheme
pub fn encode_credentials(consumer_key: &str, consumer_secret: &str) -> String {
    STANDARD.encode(format!("{}:{}", consumer_key, consumer_secret))
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Exchanges consumer credentials for bearer tokens
#[derive(Clone)]
pub struct Authenticator {
    client: Client,
    config: Arc<MpesaConfig>,
    cache: Option<Arc<Mutex<Option<CachedToken>>>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("base_url", &self.config.base_url())
            .field("cache_tokens", &self.cache.is_some())
            .finish()
    }
}

impl Authenticator {
    /// Create an authenticator sharing the given HTTP client
    pub fn new(client: Client, config: Arc<MpesaConfig>) -> Self {
        let cache = config
            .cache_tokens
            .then(|| Arc::new(Mutex::new(None)));

        Self {
            client,
            config,
            cache,
        }
    }

    /// Get a bearer token, from the cache when enabled and still fresh
    pub async fn token(&self) -> Result<String> {
        let Some(cache) = &self.cache else {
            return Ok(self.request_token().await?.access_token);
        };

        // Held across the request so concurrent callers share one refresh
        let mut cached = cache.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.refresh_at {
                debug!("reusing cached access token");
                return Ok(entry.token.clone());
            }
        }

        let response = self.request_token().await?;
        let lifetime = response
            .expires_in_secs()
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        *cached = lifetime.checked_sub(EXPIRY_MARGIN).map(|usable| CachedToken {
            token: response.access_token.clone(),
            refresh_at: Instant::now() + usable,
        });

        Ok(response.access_token)
    }

    /// Drop any cached token so the next call authenticates again
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().await.take();
        }
    }

    /// Request a new token from the gateway, bypassing the cache
    pub async fn request_token(&self) -> Result<AuthResponse> {
        let url = self.config.endpoint(AUTH_PATH);
        let credentials =
            encode_credentials(&self.config.consumer_key, &self.config.consumer_secret);

        debug!(environment = %self.config.environment, "requesting access token");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| MpesaError::authentication(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            MpesaError::authentication(format!("Failed to read token response: {}", e))
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token request rejected");
            return Err(MpesaError::authentication_rejected(status.as_u16(), body));
        }

        let auth: AuthResponse = serde_json::from_str(&body).map_err(|e| {
            MpesaError::authentication(format!("Failed to decode token response: {}", e))
        })?;

        if auth.access_token.is_empty() {
            return Err(MpesaError::authentication(
                "Token response contained an empty access_token",
            ));
        }

        debug!(expires_in = ?auth.expires_in, "received access token");
        Ok(auth)
    }
}
