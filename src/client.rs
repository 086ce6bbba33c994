//! Daraja API client
//!
//! Each operation serializes its payload, fetches a bearer token, and posts the
//! JSON to its endpoint. The response body is returned as-is whatever the HTTP
//! status: the gateway reports failures inside the body and callers inspect it.

use crate::auth::Authenticator;
use crate::config::{Environment, MpesaConfig};
use crate::types::*;
use crate::{MpesaError, Result};
use http::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE,
};
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A gateway operation and the endpoint it posts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StkPush,
    StkPushQuery,
    C2BRegisterUrl,
    C2BSimulate,
    B2CPayment,
    B2BPayment,
    Reversal,
    BalanceInquiry,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::StkPush,
        Operation::StkPushQuery,
        Operation::C2BRegisterUrl,
        Operation::C2BSimulate,
        Operation::B2CPayment,
        Operation::B2BPayment,
        Operation::Reversal,
        Operation::BalanceInquiry,
    ];

    /// Endpoint path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Operation::StkPush => "mpesa/stkpush/v1/processrequest",
            Operation::StkPushQuery => "mpesa/stkpushquery/v1/query",
            Operation::C2BRegisterUrl => "mpesa/c2b/v1/registerurl",
            Operation::C2BSimulate => "mpesa/c2b/v1/simulate",
            Operation::B2CPayment => "mpesa/b2c/v1/paymentrequest",
            Operation::B2BPayment => "mpesa/b2b/v1/paymentrequest",
            Operation::Reversal => "safaricom/reversal/v1/request",
            Operation::BalanceInquiry => "safaricom/accountbalance/v1/query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::StkPush => "stk_push",
            Operation::StkPushQuery => "stk_push_query",
            Operation::C2BRegisterUrl => "c2b_register_url",
            Operation::C2BSimulate => "c2b_simulate",
            Operation::B2CPayment => "b2c_payment",
            Operation::B2BPayment => "b2b_payment",
            Operation::Reversal => "reversal",
            Operation::BalanceInquiry => "balance_inquiry",
        };
        f.write_str(name)
    }
}

/// Header set sent with every operation
///
/// `extra` entries are added last and replace defaults of the same name.
pub fn build_headers(token: &str, extra: Option<&HeaderMap>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| MpesaError::invalid_header(format!("access token: {}", e)))?;
    headers.insert(AUTHORIZATION, bearer);

    if let Some(extra) = extra {
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }
    }

    Ok(headers)
}

/// Async client for the M-Pesa Daraja API
#[derive(Clone)]
pub struct MpesaClient {
    client: Client,
    config: Arc<MpesaConfig>,
    authenticator: Authenticator,
    extra_headers: HeaderMap,
}

impl fmt::Debug for MpesaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpesaClient")
            .field("config", &self.config)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MpesaClient {
    /// Create a client for the given credentials and environment
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        environment: Environment,
    ) -> Result<Self> {
        Self::with_config(MpesaConfig::new(consumer_key, consumer_secret, environment))
    }

    /// Create a client from a full configuration
    pub fn with_config(config: MpesaConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MpesaError::config(format!("Failed to create HTTP client: {}", e)))?;

        let config = Arc::new(config);
        let authenticator = Authenticator::new(client.clone(), config.clone());

        Ok(Self {
            client,
            config,
            authenticator,
            extra_headers: HeaderMap::new(),
        })
    }

    /// Create a client configured from the `MPESA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(MpesaConfig::from_env()?)
    }

    /// Send these headers with every operation request
    pub fn with_extra_headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers = headers;
        self
    }

    /// Add one header sent with every operation request
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| MpesaError::invalid_header(format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| MpesaError::invalid_header(format!("{}: {}", name, e)))?;
        self.extra_headers.insert(name, value);
        Ok(self)
    }

    /// Get the client configuration
    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// Full URL for an operation
    pub fn url(&self, operation: Operation) -> String {
        self.config.endpoint(operation.path())
    }

    /// Fetch a bearer token
    pub async fn authenticate(&self) -> Result<String> {
        self.authenticator.token().await
    }

    /// Forget a cached token, if token caching is enabled
    pub async fn clear_token_cache(&self) {
        self.authenticator.invalidate().await
    }

    /// Initiate an STK push to the customer's phone
    pub async fn stk_push(&self, request: &StkPush) -> Result<String> {
        self.execute(Operation::StkPush, request).await
    }

    /// Query the status of an STK push
    pub async fn stk_push_query(&self, request: &StkPushQuery) -> Result<String> {
        self.execute(Operation::StkPushQuery, request).await
    }

    /// Register C2B validation and confirmation URLs
    pub async fn c2b_register_url(&self, request: &C2BRegisterUrl) -> Result<String> {
        self.execute(Operation::C2BRegisterUrl, request).await
    }

    /// Simulate a customer paying the business
    pub async fn c2b_simulate(&self, request: &C2B) -> Result<String> {
        self.execute(Operation::C2BSimulate, request).await
    }

    /// Pay a customer from a business shortcode
    pub async fn b2c_payment(&self, request: &B2C) -> Result<String> {
        self.execute(Operation::B2CPayment, request).await
    }

    /// Pay another business
    pub async fn b2b_payment(&self, request: &B2B) -> Result<String> {
        self.execute(Operation::B2BPayment, request).await
    }

    /// Reverse a completed transaction
    pub async fn reversal(&self, request: &Reversal) -> Result<String> {
        self.execute(Operation::Reversal, request).await
    }

    /// Query the balance of a shortcode
    pub async fn balance_inquiry(&self, request: &BalanceInquiry) -> Result<String> {
        self.execute(Operation::BalanceInquiry, request).await
    }

    /// Serialize, authenticate and dispatch one operation
    pub async fn execute<T>(&self, operation: Operation, payload: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload)?;
        let token = self.authenticator.token().await?;
        let headers = build_headers(&token, Some(&self.extra_headers))?;

        info!(%operation, "sending request");
        self.dispatch(&self.url(operation), body, headers).await
    }

    /// POST a JSON body and return the response body as text, whatever the status
    pub async fn dispatch(&self, url: &str, body: Vec<u8>, headers: HeaderMap) -> Result<String> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), url, "response received");
        } else {
            warn!(status = status.as_u16(), url, "gateway returned non-success status");
        }

        Ok(response.text().await?)
    }
}
