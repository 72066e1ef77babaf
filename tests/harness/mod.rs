//! Shared fixtures for integration tests: a real RSA service account key and mock
//! endpoints for the token service and the Android Management API.

#![allow(dead_code)]

use serde_json::json;
use std::path::{Path, PathBuf};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

/// Throwaway 2048-bit RSA key, only ever used against mock servers
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");

pub const TEST_PROJECT_ID: &str = "p1";
pub const TEST_CLIENT_EMAIL: &str = "amapi-test@p1.iam.gserviceaccount.com";

pub const TOKEN_PATH: &str = "/token";

/// Form-encoded grant type every assertion exchange must carry
const JWT_BEARER_GRANT_FORM: &str =
    "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";

/// Service account key file content, shaped like the ones Google hands out
pub fn key_file_json() -> String {
    json!({
        "type": "service_account",
        "project_id": TEST_PROJECT_ID,
        "private_key_id": "0123456789abcdef",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": TEST_CLIENT_EMAIL,
        "token_uri": "https://oauth2.googleapis.com/token",
    })
    .to_string()
}

pub fn write_key_file(dir: &Path) -> PathBuf {
    let path = dir.join("service_account.json");
    std::fs::write(&path, key_file_json()).expect("Unable to write key file");
    path
}

pub fn token_uri(server: &MockServer) -> String {
    format!("{}{}", server.uri(), TOKEN_PATH)
}

/// Token endpoint answering every JWT bearer grant with `token`, expected `calls` times
pub async fn mount_token_endpoint(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(JWT_BEARER_GRANT_FORM))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3599,
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Token endpoint refusing every assertion
pub async fn mount_rejecting_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature.",
        })))
        .mount(server)
        .await;
}
