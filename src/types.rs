//! Request payloads for the Daraja API
//!
//! Field names follow the gateway's documented JSON schema exactly, including its
//! spelling quirks (`RecieverIdentifierType`, `CallBackURL`, `QueueTimeOutURL`).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Format of the `Timestamp` field in STK requests
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
/// The gateway reads timestamps as East Africa Time (UTC+3, no DST)
pub const EAT_UTC_OFFSET_HOURS: i64 = 3;

/// Token response from `oauth/v1/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token
    pub access_token: String,
    /// Lifetime in seconds. The gateway usually sends a string but numbers are
    /// accepted too; any other JSON type is treated as absent.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<String>,
}

fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl AuthResponse {
    /// Token lifetime in seconds, if the gateway sent a parsable one
    pub fn expires_in_secs(&self) -> Option<u64> {
        self.expires_in.as_deref()?.trim().parse().ok()
    }
}

/// Lipa Na M-Pesa Online (STK push) request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPush {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: String,
    pub amount: String,
    pub party_a: String,
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub call_back_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

impl StkPush {
    /// Build a paybill push from the shortcode's passkey, stamping the current time
    ///
    /// The paying phone number is used as `PartyA` and the shortcode as `PartyB`.
    pub fn new(
        short_code: impl Into<String>,
        passkey: &str,
        amount: impl Into<String>,
        phone_number: impl Into<String>,
        call_back_url: impl Into<String>,
        account_reference: impl Into<String>,
        transaction_desc: impl Into<String>,
    ) -> Self {
        let short_code = short_code.into();
        let phone_number = phone_number.into();
        let timestamp = timestamp();

        Self {
            password: stk_password(&short_code, passkey, &timestamp),
            timestamp,
            transaction_type: transaction_types::CUSTOMER_PAY_BILL_ONLINE.to_string(),
            amount: amount.into(),
            party_a: phone_number.clone(),
            party_b: short_code.clone(),
            phone_number,
            call_back_url: call_back_url.into(),
            account_reference: account_reference.into(),
            transaction_desc: transaction_desc.into(),
            business_short_code: short_code,
        }
    }

    /// Switch the transaction type, e.g. to a till (buy goods) payment
    pub fn with_transaction_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.transaction_type = transaction_type.into();
        self
    }
}

/// STK push status query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushQuery {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
}

impl StkPushQuery {
    /// Query a push by its `CheckoutRequestID`, stamping the current time
    pub fn new(
        short_code: impl Into<String>,
        passkey: &str,
        checkout_request_id: impl Into<String>,
    ) -> Self {
        let short_code = short_code.into();
        let timestamp = timestamp();

        Self {
            password: stk_password(&short_code, passkey, &timestamp),
            timestamp,
            checkout_request_id: checkout_request_id.into(),
            business_short_code: short_code,
        }
    }
}

/// C2B validation/confirmation URL registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct C2BRegisterUrl {
    pub short_code: String,
    pub response_type: String,
    #[serde(rename = "ConfirmationURL")]
    pub confirmation_url: String,
    #[serde(rename = "ValidationURL")]
    pub validation_url: String,
}

/// Simulated customer-to-business payment (sandbox only on the gateway side)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct C2B {
    pub short_code: String,
    #[serde(rename = "CommandID")]
    pub command_id: String,
    pub amount: String,
    pub msisdn: String,
    pub bill_ref_number: String,
}

/// Business-to-customer payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct B2C {
    pub initiator_name: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: String,
    pub amount: String,
    pub party_a: String,
    pub party_b: String,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_time_out_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    pub occasion: String,
}

/// Business-to-business payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct B2B {
    pub initiator: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: String,
    pub sender_identifier_type: String,
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: String,
    pub amount: String,
    pub party_a: String,
    pub party_b: String,
    pub account_reference: String,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_time_out_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

/// Transaction reversal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reversal {
    pub initiator: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: String,
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    pub amount: String,
    pub receiver_party: String,
    #[serde(rename = "RecieverIdentifierType")]
    pub receiver_identifier_type: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_time_out_url: String,
    pub remarks: String,
    pub occasion: String,
}

/// Account balance inquiry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BalanceInquiry {
    pub initiator: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: String,
    pub party_a: String,
    pub identifier_type: String,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_time_out_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

/// STK password: base64 of shortcode, passkey and timestamp concatenated
pub fn stk_password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", short_code, passkey, timestamp))
}

/// Current East Africa Time in the gateway's `YYYYMMDDHHMMSS` format
///
/// Independent of the host timezone.
pub fn timestamp() -> String {
    let eat = Utc::now().naive_utc() + Duration::hours(EAT_UTC_OFFSET_HOURS);
    eat.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a point in time the way the gateway expects
pub fn timestamp_at<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `CommandID` values
pub mod command_ids {
    pub const SALARY_PAYMENT: &str = "SalaryPayment";
    pub const BUSINESS_PAYMENT: &str = "BusinessPayment";
    pub const PROMOTION_PAYMENT: &str = "PromotionPayment";
    pub const ACCOUNT_BALANCE: &str = "AccountBalance";
    pub const CUSTOMER_PAY_BILL_ONLINE: &str = "CustomerPayBillOnline";
    pub const CUSTOMER_BUY_GOODS_ONLINE: &str = "CustomerBuyGoodsOnline";
    pub const TRANSACTION_REVERSAL: &str = "TransactionReversal";
    pub const BUSINESS_PAY_BILL: &str = "BusinessPayBill";
    pub const BUSINESS_BUY_GOODS: &str = "BusinessBuyGoods";
    pub const DISBURSE_FUNDS_TO_BUSINESS: &str = "DisburseFundsToBusiness";
    pub const BUSINESS_TO_BUSINESS_TRANSFER: &str = "BusinessToBusinessTransfer";
    pub const MERCHANT_TO_MERCHANT_TRANSFER: &str = "MerchantToMerchantTransfer";
}

/// STK `TransactionType` values
pub mod transaction_types {
    pub const CUSTOMER_PAY_BILL_ONLINE: &str = "CustomerPayBillOnline";
    pub const CUSTOMER_BUY_GOODS_ONLINE: &str = "CustomerBuyGoodsOnline";
}

/// Identifier types for `IdentifierType`, `SenderIdentifierType` and `RecieverIdentifierType`
pub mod identifier_types {
    pub const MSISDN: &str = "1";
    pub const TILL_NUMBER: &str = "2";
    pub const SHORTCODE: &str = "4";
    /// Used for reversals, where the receiver is the organisation
    pub const ORGANISATION: &str = "11";
}

/// `ResponseType` values for C2B URL registration
pub mod response_types {
    pub const COMPLETED: &str = "Completed";
    pub const CANCELLED: &str = "Cancelled";
}
