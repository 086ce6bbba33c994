//! Integration tests for the mpesa library

use mockito::{Matcher, Server, ServerGuard};
use mpesa::{
    command_ids, identifier_types, response_types, Authenticator, BalanceInquiry,
    C2BRegisterUrl, Environment, MpesaClient, MpesaConfig, Reversal, StkPush, StkPushQuery, B2B,
};
use serde_json::{json, Value};
use std::sync::Arc;

async fn mock_auth(server: &mut ServerGuard, token: &str) -> mockito::Mock {
    server
        .mock("GET", "/oauth/v1/generate")
        .match_query(Matcher::UrlEncoded(
            "grant_type".into(),
            "client_credentials".into(),
        ))
        .match_header("authorization", "Basic azpz")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "access_token": token }).to_string())
        .create_async()
        .await
}

fn sandbox_client(server: &ServerGuard) -> MpesaClient {
    let config = MpesaConfig::new("k", "s", Environment::Sandbox).with_base_url(server.url());
    MpesaClient::with_config(config).unwrap()
}

#[tokio::test]
async fn test_stk_push_end_to_end() {
    let mut server = Server::new_async().await;
    let auth = mock_auth(&mut server, "T").await;
    let push = server
        .mock("POST", "/mpesa/stkpush/v1/processrequest")
        .match_header("authorization", "Bearer T")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ResponseCode":"0"}"#)
        .create_async()
        .await;

    let client = sandbox_client(&server);
    let request = StkPush {
        business_short_code: "174379".to_string(),
        amount: "1".to_string(),
        phone_number: "254708374149".to_string(),
        ..Default::default()
    };

    let body = client.stk_push(&request).await.unwrap();
    assert_eq!(body, r#"{"ResponseCode":"0"}"#);

    auth.assert_async().await;
    push.assert_async().await;
}

#[tokio::test]
async fn test_authenticator_returns_token_field() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth(&mut server, "lZqDi1CRNvhJ2Q0UEGKlQhvH3Ffb").await;

    let config = MpesaConfig::new("k", "s", Environment::Sandbox).with_base_url(server.url());
    let authenticator = Authenticator::new(reqwest::Client::new(), Arc::new(config));

    assert_eq!(
        authenticator.token().await.unwrap(),
        "lZqDi1CRNvhJ2Q0UEGKlQhvH3Ffb"
    );
}

#[tokio::test]
async fn test_stk_push_query_body() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth(&mut server, "T").await;

    let query = StkPushQuery::new(
        "174379",
        "bfb279f9aa9bdbcf158e97dd71a467cd",
        "ws_CO_191220191020363925",
    );
    let expected = serde_json::to_value(&query).unwrap();

    let m = server
        .mock("POST", "/mpesa/stkpushquery/v1/query")
        .match_body(Matcher::Json(expected))
        .with_status(200)
        .with_body(
            json!({
                "ResponseCode": "0",
                "ResultCode": "1032",
                "ResultDesc": "Request cancelled by user"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let body = sandbox_client(&server).stk_push_query(&query).await.unwrap();
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["ResultCode"], "1032");
    m.assert_async().await;
}

#[tokio::test]
async fn test_register_url_and_reversal_bodies() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth(&mut server, "T").await;

    let register = C2BRegisterUrl {
        short_code: "600981".to_string(),
        response_type: response_types::COMPLETED.to_string(),
        confirmation_url: "https://example.com/confirmation".to_string(),
        validation_url: "https://example.com/validation".to_string(),
    };
    let reversal = Reversal {
        initiator: "testapi".to_string(),
        security_credential: "cred".to_string(),
        command_id: command_ids::TRANSACTION_REVERSAL.to_string(),
        transaction_id: "OEI2AK4Q16".to_string(),
        amount: "10".to_string(),
        receiver_party: "600981".to_string(),
        receiver_identifier_type: identifier_types::ORGANISATION.to_string(),
        result_url: "https://example.com/result".to_string(),
        queue_time_out_url: "https://example.com/timeout".to_string(),
        remarks: "duplicate".to_string(),
        occasion: "".to_string(),
    };

    let register_mock = server
        .mock("POST", "/mpesa/c2b/v1/registerurl")
        .match_body(Matcher::PartialJson(json!({
            "ShortCode": "600981",
            "ResponseType": "Completed",
            "ConfirmationURL": "https://example.com/confirmation",
            "ValidationURL": "https://example.com/validation"
        })))
        .with_status(200)
        .with_body(r#"{"ResponseDescription":"success"}"#)
        .create_async()
        .await;
    let reversal_mock = server
        .mock("POST", "/safaricom/reversal/v1/request")
        .match_body(Matcher::PartialJson(json!({
            "TransactionID": "OEI2AK4Q16",
            "RecieverIdentifierType": "11",
            "CommandID": "TransactionReversal"
        })))
        .with_status(200)
        .with_body(r#"{"ResponseCode":"0"}"#)
        .create_async()
        .await;

    let client = sandbox_client(&server);
    client.c2b_register_url(&register).await.unwrap();
    client.reversal(&reversal).await.unwrap();

    register_mock.assert_async().await;
    reversal_mock.assert_async().await;
}

#[tokio::test]
async fn test_sent_json_deserializes_to_payload() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth(&mut server, "T").await;

    let b2b = B2B {
        initiator: "testapi".to_string(),
        security_credential: "cred".to_string(),
        command_id: command_ids::BUSINESS_PAY_BILL.to_string(),
        sender_identifier_type: identifier_types::SHORTCODE.to_string(),
        receiver_identifier_type: identifier_types::SHORTCODE.to_string(),
        amount: "250".to_string(),
        party_a: "600981".to_string(),
        party_b: "600000".to_string(),
        account_reference: "ACC-9".to_string(),
        remarks: "settlement".to_string(),
        queue_time_out_url: "https://example.com/timeout".to_string(),
        result_url: "https://example.com/result".to_string(),
    };

    let expected = b2b.clone();
    let m = server
        .mock("POST", "/mpesa/b2b/v1/paymentrequest")
        .match_request(move |request| {
            request
                .body()
                .ok()
                .and_then(|body| serde_json::from_slice::<B2B>(body).ok())
                .map(|sent| sent == expected)
                .unwrap_or(false)
        })
        .with_status(200)
        .with_body(r#"{"ResponseCode":"0"}"#)
        .create_async()
        .await;

    sandbox_client(&server).b2b_payment(&b2b).await.unwrap();
    m.assert_async().await;
}

#[tokio::test]
async fn test_gateway_error_body_is_not_classified() {
    let mut server = Server::new_async().await;
    let _auth = mock_auth(&mut server, "T").await;
    let error_body = json!({
        "requestId": "11728-2929992-1",
        "errorCode": "401.002.01",
        "errorMessage": "Error Occurred - Invalid Access Token"
    })
    .to_string();
    let _m = server
        .mock("POST", "/safaricom/accountbalance/v1/query")
        .with_status(401)
        .with_body(&error_body)
        .create_async()
        .await;

    let body = sandbox_client(&server)
        .balance_inquiry(&BalanceInquiry::default())
        .await
        .unwrap();
    assert_eq!(body, error_body);
}

#[tokio::test]
async fn test_unreachable_auth_blocks_operation() {
    let config =
        MpesaConfig::new("k", "s", Environment::Sandbox).with_base_url("http://127.0.0.1:1");
    let client = MpesaClient::with_config(config).unwrap();

    let err = client.stk_push(&StkPush::default()).await.unwrap_err();
    assert!(err.is_authentication(), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_concurrent_operations_share_client() {
    let mut server = Server::new_async().await;
    let auth = server
        .mock("GET", "/oauth/v1/generate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"access_token":"T"}"#)
        .expect(4)
        .create_async()
        .await;
    let posts = server
        .mock("POST", "/mpesa/stkpush/v1/processrequest")
        .with_status(200)
        .with_body(r#"{"ResponseCode":"0"}"#)
        .expect(4)
        .create_async()
        .await;

    let client = sandbox_client(&server);
    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.stk_push(&StkPush::default()).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), r#"{"ResponseCode":"0"}"#);
    }

    auth.assert_async().await;
    posts.assert_async().await;
}
