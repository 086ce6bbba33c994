//! Example: prompt a customer's phone for payment and poll the result
//!
//! Reads credentials from `MPESA_CONSUMER_KEY`, `MPESA_CONSUMER_SECRET` and
//! (optionally) `MPESA_ENVIRONMENT`. The sandbox shortcode and passkey are the
//! public test values published for the Daraja sandbox.

use mpesa::{MpesaClient, StkPush, StkPushQuery};
use serde_json::Value;
use std::time::Duration;

const SANDBOX_SHORTCODE: &str = "174379";
const SANDBOX_PASSKEY: &str = "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919";

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let client = MpesaClient::from_env()?;
    println!("Using {} at {}", client.environment(), client.config().base_url());

    let phone = std::env::var("MPESA_TEST_PHONE").unwrap_or_else(|_| "254708374149".to_string());
    let push = StkPush::new(
        SANDBOX_SHORTCODE,
        SANDBOX_PASSKEY,
        "1",
        phone,
        "https://example.com/mpesa/callback",
        "DEMO-001",
        "Demo payment",
    );

    let body = client.stk_push(&push).await?;
    println!("STK push response: {}", body);

    let response: Value = serde_json::from_str(&body)?;
    let Some(checkout_request_id) = response["CheckoutRequestID"].as_str() else {
        println!("Gateway did not accept the push, stopping");
        return Ok(());
    };

    // Give the customer time to respond on their handset
    tokio::time::sleep(Duration::from_secs(20)).await;

    let query = StkPushQuery::new(SANDBOX_SHORTCODE, SANDBOX_PASSKEY, checkout_request_id);
    let status = client.stk_push_query(&query).await?;
    println!("STK push status: {}", status);

    Ok(())
}
