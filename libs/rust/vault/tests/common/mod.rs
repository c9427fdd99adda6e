//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use vault_session::VaultSettings;
use wiremock::MockServer;

pub const SECRET_ID_PATH: &str = "/v1/auth/approle/role/developer/secret-id";
pub const LOGIN_PATH: &str = "/v1/auth/approle/login";
pub const LOOKUP_PATH: &str = "/v1/auth/token/lookup-self";
pub const RENEW_PATH: &str = "/v1/auth/token/renew-self";
pub const KV_PATH: &str = "/v1/secret/data/demo";

pub const DEFAULT_TOKEN: &str = "root-bootstrap";
pub const ROLE_ID: &str = "role-123";

/// Settings pointing at the mock server, with a default token and role id.
pub fn settings(server: &MockServer) -> VaultSettings {
    VaultSettings::new(&server.uri(), DEFAULT_TOKEN)
        .unwrap()
        .with_role_id(ROLE_ID)
}

/// Settings pointing at the mock server, without a role id.
pub fn settings_without_role(server: &MockServer) -> VaultSettings {
    VaultSettings::new(&server.uri(), DEFAULT_TOKEN).unwrap()
}

/// A full KV v2 response for the demo secret.
pub fn kv_body() -> Value {
    json!({
        "request_id": "5b5c4b7e",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "data": {
                "database": {
                    "host": "db.internal",
                    "port": 5432,
                    "user": "orders_app",
                    "pass": "hunter2-but-longer",
                    "name": "orders"
                }
            },
            "metadata": {
                "created_time": "2024-05-01T10:00:00Z",
                "deletion_time": "",
                "destroyed": false,
                "version": 2
            }
        }
    })
}

/// Paths of every request the server has seen, in arrival order.
pub async fn received_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}
