//! End-to-end session flows against a mock backend: streaming
//! generation folding into the transcript, optimistic chat persistence,
//! and the single-flight guard.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use planor_client::{ClientConfig, RequestClient};
use planor_core::{PlanorError, Role};
use planor_session::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> SessionStore {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let client = Arc::new(RequestClient::new(ClientConfig::new(server.uri())));
    SessionStore::new(client)
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

#[tokio::test]
async fn generation_folds_chunks_into_one_assistant_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p1/generate"))
        .and(body_partial_json(serde_json::json!({"user_message": "go"})))
        .respond_with(sse(
            "data: {\"type\":\"chunk\",\"content\":\"Hel\"}\n\n\
             data: {\"type\":\"chunk\",\"content\":\"lo\"}\n\n\
             data: {\"type\":\"complete\"}\n\n",
        ))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let handle = store.generate_plan("p1", "go").unwrap();
    assert!(store.is_loading("p1"));
    handle.join().await;

    assert!(!store.is_loading("p1"));
    let messages = store.messages("p1");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "go");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Hello");
}

#[tokio::test]
async fn failed_generation_keeps_partial_output_and_adds_failure_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p1/generate"))
        .respond_with(sse(
            "data: {\"type\":\"chunk\",\"content\":\"## Partial plan\"}\n\n\
             data: {\"type\":\"error\",\"message\":\"model overloaded\"}\n\n",
        ))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let handle = store.generate_plan("p1", "go").unwrap();
    handle.join().await;

    assert!(!store.is_loading("p1"));
    let messages = store.messages("p1");
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "## Partial plan");
    assert_eq!(messages[2].role, Role::Assistant);
    assert!(messages[2].content.contains("model overloaded"));
}

#[tokio::test]
async fn second_generation_for_same_plan_is_rejected_while_one_is_active() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p1/generate"))
        .respond_with(
            sse("data: {\"type\":\"complete\"}\n\n").set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let handle = store.generate_plan("p1", "first").unwrap();

    let err = store.generate_plan("p1", "second").unwrap_err();
    assert!(matches!(err, PlanorError::Session(_)), "got {err:?}");
    // The rejected call must not have touched the transcript.
    assert_eq!(store.messages("p1").len(), 1);

    handle.cancel();
    handle.join().await;
    assert!(!store.is_loading("p1"));
}

#[tokio::test]
async fn generations_for_unrelated_plans_run_independently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p1/generate"))
        .respond_with(
            sse("data: {\"type\":\"complete\"}\n\n").set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p2/generate"))
        .respond_with(sse(
            "data: {\"type\":\"chunk\",\"content\":\"fast\"}\n\n\
             data: {\"type\":\"complete\"}\n\n",
        ))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let slow = store.generate_plan("p1", "slow one").unwrap();
    let fast = store.generate_plan("p2", "fast one").unwrap();

    fast.join().await;
    assert!(!store.is_loading("p2"));
    assert!(store.is_loading("p1"));
    assert_eq!(store.messages("p2")[1].content, "fast");

    slow.cancel();
    slow.join().await;
}

#[tokio::test]
async fn cancelled_generation_clears_loading_and_reports_abort() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p1/generate"))
        .respond_with(
            sse("data: {\"type\":\"complete\"}\n\n").set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let handle = store.generate_plan("p1", "go").unwrap();
    handle.cancel();
    handle.join().await;

    assert!(!store.is_loading("p1"));
    let messages = store.messages("p1");
    // User message plus the abort notice; no phantom assistant output.
    assert_eq!(messages.len(), 2);
    assert!(messages[1].content.contains("aborted"));
}

#[tokio::test]
async fn generation_context_includes_latest_plan_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/plans/p1/plan_versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "v1",
                "plan_id": "p1",
                "version": 1,
                "content": "## Existing plan",
                "created_at": "2025-03-01T10:00:00Z",
            }
        ])))
        .mount(&server)
        .await;
    // The generate mock only matches when the artifact rode along.
    Mock::given(method("POST"))
        .and(path("/api/business/plans/p1/generate"))
        .and(body_partial_json(
            serde_json::json!({"plan_artifact": "## Existing plan"}),
        ))
        .respond_with(sse("data: {\"type\":\"complete\"}\n\n"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.refresh_plan_versions("p1").await.unwrap();
    assert_eq!(store.current_version("p1").unwrap().version, 1);

    let handle = store.generate_plan("p1", "refine it").unwrap();
    handle.join().await;

    // An unmatched request would have ended in an API error message.
    let messages = store.messages("p1");
    assert_eq!(messages.len(), 1);
    assert!(!store.is_loading("p1"));
}

#[tokio::test]
async fn send_message_creates_then_updates_the_canonical_session() {
    let server = MockServer::start().await;
    let session_json = serde_json::json!({
        "id": "c1",
        "plan_id": "p1",
        "messages": [{"role": "user", "content": "hello"}],
        "status": "active",
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-01T10:00:00Z",
    });
    Mock::given(method("POST"))
        .and(path("/api/plans/p1/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/chat/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let created = store.send_message("p1", "hello").await.unwrap();
    assert_eq!(created.id, "c1");

    // Second send goes through the adopted session id, not a new POST.
    store.send_message("p1", "and another thing").await.unwrap();

    let messages = store.messages("p1");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[1].content, "and another thing");
}

#[tokio::test]
async fn failed_chat_persist_keeps_the_optimistic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/plans/p1/chat"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"detail": "db down"})),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.send_message("p1", "precious input").await.unwrap_err();
    assert!(matches!(err, PlanorError::Api { status: 500, .. }));

    let messages = store.messages("p1");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "precious input");
}
