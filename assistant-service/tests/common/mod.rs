//! Shared helpers for assistant-service integration tests.
#![allow(dead_code)]

use assistant_service::config::AssistantConfig;
use assistant_service::services::providers::ChatProvider;
use assistant_service::startup::{build_router, AppState};
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, Response},
    Router,
};
use secrecy::Secret;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub fn test_config() -> AssistantConfig {
    let mut config = AssistantConfig::default();
    config.common.port = 0;
    config.anthropic.api_key = Some(Secret::new("test-api-key".to_string()));
    config
}

pub fn router_with(provider: Arc<dyn ChatProvider>, config: &AssistantConfig) -> Router {
    build_router(AppState::new(provider, config), config)
}

/// Socket peer info as `into_make_service_with_connect_info` would attach it.
pub fn peer(client_ip: &str) -> ConnectInfo<SocketAddr> {
    ConnectInfo(
        format!("{}:50000", client_ip)
            .parse()
            .expect("Invalid client ip"),
    )
}

pub fn chat_request(body: &str, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .extension(peer(client_ip))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, client_ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .extension(peer(client_ip))
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// A throwaway static directory containing an `index.html` and one asset.
pub fn temp_static_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("assistant-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create static dir");
    std::fs::write(
        dir.join("index.html"),
        "<!doctype html><title>Companion</title><div id=\"app\"></div>",
    )
    .expect("Failed to write index.html");
    std::fs::write(dir.join("app.js"), "console.log('companion');").expect("Failed to write app.js");
    dir
}

/// Loose ISO-8601 check for `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn is_iso_timestamp(value: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(value).is_ok() && value.ends_with('Z')
}
