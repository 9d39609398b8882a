//! Router-level tests for `/api/chat` and `/api/chat/test`.
//!
//! Drive the router in-process with a scripted provider; no network needed.

mod common;

use assistant_service::services::providers::mock::{MockChatProvider, MockOutcome};
use axum::http::StatusCode;
use common::{chat_request, get_request, is_iso_timestamp, json_body, router_with, test_config};
use std::sync::Arc;
use tower::util::ServiceExt;

const CLIENT: &str = "192.0.2.10";

#[tokio::test]
async fn chat_returns_upstream_text_with_timestamp() {
    let provider = Arc::new(MockChatProvider::replying("Your keys are on the hook by the door."));
    let app = router_with(provider.clone(), &test_config());

    let response = app
        .oneshot(chat_request(r#"{"message": "Where are my keys?"}"#, CLIENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["response"], "Your keys are on the hook by the door.");
    assert!(is_iso_timestamp(body["timestamp"].as_str().unwrap()));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn chat_sends_context_as_system_prompt_and_message_as_only_turn() {
    let provider = Arc::new(MockChatProvider::replying("ok"));
    let app = router_with(provider.clone(), &test_config());

    let body = r#"{
        "message": "Did I take my pills?",
        "userData": {
            "emergencyContacts": [{"name": "Sarah", "phone": "555-1234"}],
            "waterIntake": 4,
            "medications": [{"name": "Lisinopril", "time": "8:00 AM", "taken": true}],
            "location": "Springfield"
        }
    }"#;
    let response = app.oneshot(chat_request(body, CLIENT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let call = provider.last_call().expect("provider was not called");
    assert_eq!(call.message, "Did I take my pills?");
    assert_eq!(call.max_tokens, 300);
    assert_eq!(call.temperature, Some(0.7));

    let system = call.system.expect("system prompt missing");
    let context = system
        .split("CURRENT USER INFORMATION:\n")
        .nth(1)
        .expect("context section missing");
    let lines: Vec<&str> = context.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Current date and time: "));
    assert_eq!(lines[1], "Location: Springfield");
    assert_eq!(lines[2], "Medications: Lisinopril at 8:00 AM (taken today)");
    assert_eq!(lines[3], "Water intake: 4 cups out of 8 cup daily goal");
    assert_eq!(lines[4], "Emergency contacts: Sarah: 555-1234");
}

#[tokio::test]
async fn invalid_messages_are_rejected_without_upstream_call() {
    let provider = Arc::new(MockChatProvider::replying("never"));
    let app = router_with(provider.clone(), &test_config());

    for body in [
        r#"{}"#,
        r#"{"message": null}"#,
        r#"{"message": 12}"#,
        r#"{"message": ""}"#,
        r#"{"message": "unterminated"#,
    ] {
        let response = app.clone().oneshot(chat_request(body, CLIENT)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let json = json_body(response).await;
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn malformed_user_data_does_not_fail_the_request() {
    let provider = Arc::new(MockChatProvider::replying("hello"));
    let app = router_with(provider.clone(), &test_config());

    let body = r#"{"message": "hi", "userData": {"medications": "lots", "itemLocations": 7}}"#;
    let response = app.oneshot(chat_request(body, CLIENT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let system = provider.last_call().unwrap().system.unwrap();
    let context = system.split("CURRENT USER INFORMATION:\n").nth(1).unwrap();
    assert_eq!(context.lines().count(), 1);
}

#[tokio::test]
async fn upstream_auth_failure_maps_to_500_with_fallback() {
    let provider = Arc::new(MockChatProvider::new(MockOutcome::AuthenticationError));
    let app = router_with(provider, &test_config());

    let response = app
        .oneshot(chat_request(r#"{"message": "hello"}"#, CLIENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(body["fallback"].as_str().is_some_and(|f| !f.is_empty()));
}

#[tokio::test]
async fn upstream_failures_each_get_a_distinct_fallback() {
    let mut fallbacks = Vec::new();

    for (outcome, expected) in [
        (MockOutcome::AuthenticationError, StatusCode::INTERNAL_SERVER_ERROR),
        (MockOutcome::RateLimited, StatusCode::TOO_MANY_REQUESTS),
        (MockOutcome::NetworkError, StatusCode::INTERNAL_SERVER_ERROR),
    ] {
        let provider = Arc::new(MockChatProvider::new(outcome));
        let app = router_with(provider.clone(), &test_config());

        let response = app
            .oneshot(chat_request(r#"{"message": "hello"}"#, CLIENT))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
        assert_eq!(provider.call_count(), 1, "no retries expected");

        let body = json_body(response).await;
        fallbacks.push(body["fallback"].as_str().unwrap().to_string());
    }

    assert_ne!(fallbacks[0], fallbacks[1]);
    assert_ne!(fallbacks[1], fallbacks[2]);
    assert_ne!(fallbacks[0], fallbacks[2]);
}

#[tokio::test]
async fn probe_reports_success_without_user_context() {
    let provider = Arc::new(MockChatProvider::replying("Hello there!"));
    let app = router_with(provider.clone(), &test_config());

    let response = app.oneshot(get_request("/api/chat/test", CLIENT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["response"], "Hello there!");
    assert!(body["message"].as_str().is_some());

    let call = provider.last_call().unwrap();
    assert!(call.system.is_none());
    assert_eq!(call.max_tokens, 50);
}

#[tokio::test]
async fn probe_failure_is_500_even_when_rate_limited() {
    let provider = Arc::new(MockChatProvider::new(MockOutcome::RateLimited));
    let app = router_with(provider, &test_config());

    let response = app.oneshot(get_request("/api/chat/test", CLIENT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "Rate limited");
}
