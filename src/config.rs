//! Client configuration: credentials, target environment and HTTP options

use crate::{MpesaError, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Sandbox base URL
pub const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke/";
/// Production base URL
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke/";
/// Upper bound on every HTTP call made by the client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the consumer key
pub const ENV_CONSUMER_KEY: &str = "MPESA_CONSUMER_KEY";
/// Environment variable holding the consumer secret
pub const ENV_CONSUMER_SECRET: &str = "MPESA_CONSUMER_SECRET";
/// Environment variable selecting `sandbox` or `production`
pub const ENV_ENVIRONMENT: &str = "MPESA_ENVIRONMENT";
/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "MPESA_BASE_URL";

/// Gateway environment
///
/// Config files accept the same spellings as [`FromStr`], in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Environment {
    /// Daraja sandbox
    #[default]
    Sandbox,
    /// Live gateway
    Production,
}

impl Environment {
    /// Base URL for this environment, always with a trailing slash
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = MpesaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for Environment {
    type Err = MpesaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "production" | "live" => Ok(Environment::Production),
            other => Err(MpesaError::config(format!(
                "Unknown environment '{}', expected 'sandbox' or 'production'",
                other
            ))),
        }
    }
}

/// Configuration for an [`MpesaClient`](crate::MpesaClient)
#[derive(Clone, Deserialize)]
pub struct MpesaConfig {
    /// Daraja consumer key
    pub consumer_key: String,
    /// Daraja consumer secret
    pub consumer_secret: String,
    /// Target environment
    #[serde(default)]
    pub environment: Environment,
    /// Timeout applied to each HTTP call
    #[serde(
        rename = "timeout_secs",
        default = "default_timeout",
        deserialize_with = "deserialize_secs"
    )]
    pub timeout: Duration,
    /// Replaces the environment's base URL, e.g. to point at a mock server
    #[serde(default)]
    pub base_url: Option<String>,
    /// Reuse access tokens until shortly before they expire
    #[serde(default)]
    pub cache_tokens: bool,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .field("cache_tokens", &self.cache_tokens)
            .finish()
    }
}

impl MpesaConfig {
    /// Create a new config with the default timeout and no token cache
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            environment,
            timeout: DEFAULT_TIMEOUT,
            base_url: None,
            cache_tokens: false,
        }
    }

    /// Load configuration from the `MPESA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).filter(|value| !value.is_empty()).ok_or_else(|| {
                MpesaError::config(format!("Missing credentials: {} must be set", name))
            })
        };

        let consumer_key = required(ENV_CONSUMER_KEY)?;
        let consumer_secret = required(ENV_CONSUMER_SECRET)?;
        let environment = match lookup(ENV_ENVIRONMENT) {
            Some(value) if !value.is_empty() => value.parse()?,
            _ => Environment::default(),
        };

        let mut config = Self::new(consumer_key, consumer_secret, environment);
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|value| !value.is_empty()) {
            config = config.with_base_url(base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MpesaError::config(format!("Failed to read config file: {}", e)))?;

        let config: MpesaConfig = serde_json::from_str(&content)
            .map_err(|e| MpesaError::config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.consumer_key.is_empty() {
            return Err(MpesaError::config("Consumer key cannot be empty"));
        }

        if self.consumer_secret.is_empty() {
            return Err(MpesaError::config("Consumer secret cannot be empty"));
        }

        if self.timeout.is_zero() {
            return Err(MpesaError::config("Timeout must be greater than zero"));
        }

        if let Some(base_url) = &self.base_url {
            let parsed = url::Url::parse(base_url).map_err(|e| {
                MpesaError::config(format!("Invalid base URL '{}': {}", base_url, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(MpesaError::config(
                    "Base URL must start with http:// or https://",
                ));
            }
        }

        Ok(())
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the client at a different host than the environment's
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Enable or disable access token reuse
    pub fn with_token_cache(mut self, enabled: bool) -> Self {
        self.cache_tokens = enabled;
        self
    }

    /// Base URL every request is built from
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    /// Join an endpoint path onto the base URL with exactly one separator
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
