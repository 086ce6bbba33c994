//! Example: business payouts and a balance check against one client
//!
//! `MPESA_SECURITY_CREDENTIAL` must hold the initiator password encrypted with
//! the gateway's public certificate, as generated on the Daraja portal.

use mpesa::{command_ids, identifier_types, BalanceInquiry, MpesaClient, B2C};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let client = MpesaClient::from_env()?;
    let security_credential = std::env::var("MPESA_SECURITY_CREDENTIAL")?;
    let initiator = std::env::var("MPESA_INITIATOR").unwrap_or_else(|_| "testapi".to_string());
    let short_code = std::env::var("MPESA_SHORTCODE").unwrap_or_else(|_| "600981".to_string());

    let payout = B2C {
        initiator_name: initiator.clone(),
        security_credential: security_credential.clone(),
        command_id: command_ids::BUSINESS_PAYMENT.to_string(),
        amount: "10".to_string(),
        party_a: short_code.clone(),
        party_b: "254708374149".to_string(),
        remarks: "Demo payout".to_string(),
        queue_time_out_url: "https://example.com/mpesa/timeout".to_string(),
        result_url: "https://example.com/mpesa/result".to_string(),
        occasion: "Demo".to_string(),
    };
    println!("B2C response: {}", client.b2c_payment(&payout).await?);

    let balance = BalanceInquiry {
        initiator,
        security_credential,
        command_id: command_ids::ACCOUNT_BALANCE.to_string(),
        party_a: short_code,
        identifier_type: identifier_types::SHORTCODE.to_string(),
        remarks: "Demo balance".to_string(),
        queue_time_out_url: "https://example.com/mpesa/timeout".to_string(),
        result_url: "https://example.com/mpesa/result".to_string(),
    };
    println!("Balance response: {}", client.balance_inquiry(&balance).await?);

    Ok(())
}
