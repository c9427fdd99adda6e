//! Transport behaviour against a mock Vault.

mod common;

use common::{DEFAULT_TOKEN, settings};
use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_test::traced_test;
use vault_session::{VaultError, VaultSettings, VaultTransport};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Echo {
    value: String,
}

#[tokio::test]
async fn test_non_success_statuses_return_err_with_status_and_body() {
    let server = MockServer::start().await;
    let transport = VaultTransport::new(&settings(&server)).unwrap();

    for status in [400_u16, 403, 404, 429, 500, 503] {
        let route = format!("/v1/status/{status}");
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_string("{\"errors\":[\"nope\"]}"))
            .mount(&server)
            .await;

        let result = transport.get::<Echo>(&route).await;
        match result {
            Err(VaultError::Status { status: got, body }) => {
                assert_eq!(got, status);
                assert!(body.contains("nope"));
            }
            other => panic!("expected status error for {status}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_attaches_bearer_token_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/echo"))
        .and(header("Authorization", format!("Bearer {DEFAULT_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    let echo: Echo = transport.get("v1/echo").await.unwrap();
    assert_eq!(echo.value, "ok");
}

#[tokio::test]
async fn test_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "increment": "1h" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "posted" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    let echo: Echo = transport
        .send(Method::POST, "/v1/echo", Some(&json!({ "increment": "1h" })))
        .await
        .unwrap();
    assert_eq!(echo.value, "posted");
}

#[tokio::test]
async fn test_undecodable_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    let result = transport.get::<Echo>("/v1/echo").await;
    assert!(matches!(result, Err(VaultError::Serialization(_))));
}

#[tokio::test]
async fn test_anonymous_post_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "in" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    let _: Echo = transport
        .post_anonymous("/v1/auth/approle/login", &json!({ "role_id": "r", "secret_id": "s" }))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_empty_token_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "ok" })))
        .mount(&server)
        .await;

    let settings = VaultSettings::new(&server.uri(), "").unwrap();
    let transport = VaultTransport::new(&settings).unwrap();
    let _: Echo = transport.get("/v1/echo").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_replaced_token_used_on_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/echo"))
        .and(header("Authorization", "Bearer rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    transport.replace_token(SecretString::from("rotated")).await;
    let _: Value = transport.get("/v1/echo").await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let settings = VaultSettings::new("http://127.0.0.1:1", "token").unwrap();
    let transport = VaultTransport::new(&settings).unwrap();

    let result = transport.get::<Echo>("/v1/echo").await;
    let err = result.unwrap_err();
    assert!(matches!(err, VaultError::Unavailable(_)));
    assert!(err.is_retryable());
}

#[traced_test]
#[tokio::test]
async fn test_failed_request_logs_method_path_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no secret here"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    let result = transport.get::<Value>("/v1/secret/data/missing").await;
    assert!(matches!(result, Err(VaultError::Status { status: 404, .. })));

    assert!(logs_contain("Sending request to Vault"));
    assert!(logs_contain("HTTP request to Vault failed"));
    assert!(logs_contain("method=GET"));
    assert!(logs_contain("/v1/secret/data/missing"));
    assert!(logs_contain("status=404"));
    assert!(logs_contain("body=no secret here"));
}

#[traced_test]
#[tokio::test]
async fn test_undecodable_body_is_logged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = VaultTransport::new(&settings(&server)).unwrap();
    let result = transport
        .post::<Value, _>("v1/auth/token/renew-self", &json!({ "increment": "1h" }))
        .await;
    assert!(matches!(result, Err(VaultError::Serialization(_))));

    assert!(logs_contain("Failed to decode Vault response"));
    assert!(logs_contain("method=POST"));
}
