//! # mpesa - Safaricom M-Pesa Daraja API client
//!
//! An async client for the M-Pesa Daraja REST API: STK push, C2B, B2C, B2B,
//! reversals and balance inquiries. Every operation fetches a bearer token,
//! posts the request as JSON and returns the gateway's raw response body.
//!
//! ```rust,no_run
//! use mpesa::{Environment, MpesaClient, StkPush};
//!
//! # async fn run() -> mpesa::Result<()> {
//! let client = MpesaClient::new("consumer-key", "consumer-secret", Environment::Sandbox)?;
//! let push = StkPush::new(
//!     "174379",
//!     "passkey",
//!     "1",
//!     "254708374149",
//!     "https://example.com/callback",
//!     "INV-001",
//!     "Invoice payment",
//! );
//! let body = client.stk_push(&push).await?;
//! println!("{}", body);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::{build_headers, MpesaClient, Operation};
pub use config::{Environment, MpesaConfig};
pub use error::{MpesaError, Result};
pub use types::*;

/// Current version of the mpesa library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports() {
        let production = MpesaConfig::new("k", "s", Environment::Production);
        assert_eq!(production.base_url(), config::PRODUCTION_BASE_URL);
        assert_eq!(Operation::ALL.len(), 8);
        assert_eq!(command_ids::TRANSACTION_REVERSAL, "TransactionReversal");
        assert_eq!(identifier_types::SHORTCODE, "4");
        assert_eq!(response_types::COMPLETED, "Completed");
    }
}
