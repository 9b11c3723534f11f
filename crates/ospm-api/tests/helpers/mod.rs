//! Test helpers: a router over the in-memory store.
//!
//! Run from workspace root: `cargo test -p ospm-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use ospm_api::setup::routes;
use ospm_api::AppState;
use ospm_core::{Config, StoreBackend, Whitelist, WhitelistConfig};
use ospm_db::MemoryStore;
use serde_json::{json, Value};

/// Address inside [`WHITELIST`]
pub const ALLOWED_IP: &str = "172.16.1.5";
/// Address outside [`WHITELIST`]
pub const DENIED_IP: &str = "192.168.1.99";
pub const WHITELIST: &str = "172.16.0.0/16, 10.0.0.1";

pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// API path prefix for tests
pub fn api_path(path: &str) -> String {
    format!("{}{}", ospm_api::constants::API_PREFIX, path)
}

/// Every guarded operation uses the same whitelist; one trusted proxy so
/// tests choose the client address through `X-Forwarded-For`.
pub fn test_config() -> Config {
    let whitelist = Whitelist::parse(WHITELIST);
    Config {
        listen_address: "127.0.0.1".to_string(),
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        store_backend: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        db_timeout_seconds: 1,
        trusted_proxy_count: 1,
        whitelists: WhitelistConfig {
            list_all: whitelist.clone(),
            soft_delete: whitelist.clone(),
            hard_delete: whitelist.clone(),
            recover_undo: whitelist,
        },
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config())
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    let store = MemoryStore::new();
    let router = routes::setup_routes(AppState::new(store.clone(), &config))
        .expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    TestApp { server, store }
}

pub fn organization_body(tag: &str) -> Value {
    json!({
        "balance": 0,
        "allow_negative_balance": false,
        "negative_balance_threshold": 0,
        "details": {
            "name": format!("org-{}", tag),
            "email": format!("contact@{}.example", tag)
        },
        "owner": {
            "type": "legal",
            "name": format!("owner-{}", tag),
            "email": format!("owner@{}.example", tag),
            "mobile": format!("+1-555-{}", tag),
            "legal_national_id": format!("NID-{}", tag)
        }
    })
}

/// Create an organization through the API and return its id
pub async fn create_organization(client: &TestServer, tag: &str) -> String {
    let response = client
        .post(&api_path("/organizations"))
        .json(&organization_body(tag))
        .await;
    assert_eq!(response.status_code(), 201, "create organization");
    let body: Value = response.json();
    body["organization_id"]
        .as_str()
        .expect("organization_id in response")
        .to_string()
}
