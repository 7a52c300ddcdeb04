// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over HTTP against real SQLite storage and ledger.
//!
//! Each test builds an isolated SqliteHarness on a temp database file.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use helpmate_chat::{ChatPolicy, ChatService, Reconciler};
use helpmate_config::model::{HelpmateConfig, ServerConfig};
use helpmate_core::{
    ChatMessage, Clock, MessageStore, NotificationLedger, PluginAdapter, SessionId, UserId,
};
use helpmate_gateway::{build_router, sign_caller_cookie, AppState};
use helpmate_test_utils::SqliteHarness;
use helpmate_test_utils::fixtures::{active_session, alice, bob, carol};

const SECRET: &str = "e2e-secret-e2e-secret-e2e-secret!";

async fn harness() -> SqliteHarness {
    let mut config = HelpmateConfig::default();
    config.server = ServerConfig {
        auth_secret: Some(SECRET.to_string()),
        ..ServerConfig::default()
    };
    SqliteHarness::builder()
        .with_config(config)
        .with_session(active_session("s-1"))
        .build()
        .await
        .unwrap()
}

fn router(h: &SqliteHarness) -> Router {
    let chat = Arc::new(ChatService::new(
        h.storage.clone(),
        h.storage.clone(),
        h.ledger.clone(),
        h.attachments.clone(),
        h.clock.clone(),
        ChatPolicy::from(&h.config.chat),
    ));
    let adapters = vec![
        h.storage.clone() as Arc<dyn PluginAdapter>,
        h.ledger.clone() as Arc<dyn PluginAdapter>,
    ];
    build_router(
        AppState::new(chat, &h.config.server, adapters),
        Duration::from_secs(5),
    )
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: &UserId,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri).header(
        header::COOKIE,
        format!("helpmate_session={}", sign_caller_cookie(SECRET, user)),
    );
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn conversation_round_trip() {
    let h = harness().await;
    let app = router(&h);

    let (status, m1) = call(&app, Method::POST, "/chat/s-1", &alice(), Some(json!({ "content": "hello" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    h.clock.advance(chrono::Duration::seconds(1));
    let (status, _) = call(&app, Method::POST, "/chat/s-1", &bob(), Some(json!({ "content": "hi alice" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = call(&app, Method::GET, "/chat/s-1", &alice(), None).await;
    assert_eq!(list["count"], 2);
    assert_eq!(list["messages"][0]["content"], "hello");
    assert_eq!(list["messages"][1]["content"], "hi alice");

    let (_, unread) = call(&app, Method::GET, "/notifications/unread", &bob(), None).await;
    assert_eq!(unread["unread"], 1);

    let id = m1["id"].as_str().unwrap();
    let (status, read) = call(&app, Method::PATCH, &format!("/chat/{id}/read"), &bob(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["is_read"], true);

    let (_, unread) = call(&app, Method::GET, "/notifications/unread", &bob(), None).await;
    assert_eq!(unread["unread"], 0);
    let (_, unread) = call(&app, Method::GET, "/notifications/unread", &alice(), None).await;
    assert_eq!(unread["unread"], 1);

    let (status, body) = call(&app, Method::PUT, &format!("/chat/{id}"), &alice(), Some(json!({ "content": "edited" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "already_read");
}

#[tokio::test]
async fn outsider_sees_forbidden_everywhere() {
    let h = harness().await;
    let app = router(&h);
    let (_, m) = call(&app, Method::POST, "/chat/s-1", &alice(), Some(json!({ "content": "x" }))).await;
    let id = m["id"].as_str().unwrap();

    for (method, uri, body) in [
        (Method::GET, "/chat/s-1".to_string(), None),
        (Method::POST, "/chat/s-1".to_string(), Some(json!({ "content": "y" }))),
        (Method::PATCH, "/chat/s-1/readAll".to_string(), None),
        (Method::PATCH, format!("/chat/{id}/read"), None),
        (Method::PUT, format!("/chat/{id}"), Some(json!({ "content": "z" }))),
    ] {
        let (status, _) = call(&app, method.clone(), &uri, &carol(), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
    let thread = h.storage.list_messages(&SessionId::from("s-1")).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].content, "x");
}

#[tokio::test]
async fn interrupted_send_is_backfilled() {
    let h = harness().await;
    let orphan = ChatMessage::new(
        SessionId::from("s-1"),
        alice(),
        bob(),
        "lost notification".into(),
        Vec::new(),
        None,
        h.clock.now(),
    )
    .unwrap();
    h.storage.insert_message(&orphan).await.unwrap();
    assert_eq!(h.ledger.unread_count(&bob()).await.unwrap(), 0);

    let reconciler = Reconciler::new(
        h.storage.clone(),
        h.ledger.clone(),
        h.clock.clone(),
        &h.config.reconcile,
    );
    let early = reconciler.run_once(h.clock.now()).await.unwrap();
    assert_eq!(early.scanned, 0, "messages inside the grace period are left alone");

    h.clock.advance(chrono::Duration::minutes(1));
    let report = reconciler.run_once(h.clock.now()).await.unwrap();
    assert_eq!(report.repaired, 1);
    assert_eq!(h.ledger.unread_count(&bob()).await.unwrap(), 1);

    let linked = h.storage.get_message(&orphan.id).await.unwrap().unwrap();
    assert!(linked.notif_id.is_some());
}

#[tokio::test]
async fn health_reports_sqlite_adapters() {
    let h = harness().await;
    let app = router(&h);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    let names: Vec<_> = body["adapters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["sqlite", "sqlite-ledger"]);
}
