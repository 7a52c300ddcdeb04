// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the chat API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use helpmate_chat::{EditMessage, NewMessage, ReadReceipt};
use helpmate_core::{Attachment, ChatMessage, HealthStatus, HelpmateError, MessageId, SessionId};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::server::AppState;

/// Header carrying the client's idempotency key for sends.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Request body for `POST /chat/{session_id}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendRequest {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Request body for `PUT /chat/{message_id}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

/// Response body for `GET /chat/{session_id}`.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError(HelpmateError::Validation(rejection.body_text())))
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| {
            ApiError(HelpmateError::Validation(
                "Idempotency-Key must be visible ASCII".to_string(),
            ))
        })?
        .trim();
    if key.is_empty() || key.len() > 255 {
        return Err(ApiError(HelpmateError::Validation(
            "Idempotency-Key must be 1 to 255 characters".to_string(),
        )));
    }
    Ok(Some(key.to_string()))
}

/// POST /chat/{session_id}
///
/// 201 with the new message, or 200 with the original when the
/// idempotency key was seen before.
pub async fn send_message(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    let client_key = idempotency_key(&headers)?;
    let outcome = state
        .chat
        .send_message(
            &SessionId::from(session_id),
            &caller,
            NewMessage {
                content: request.content,
                attachments: request.attachments,
                client_key,
            },
        )
        .await?;
    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.message)).into_response())
}

/// GET /chat/{session_id}
pub async fn list_messages(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(session_id): Path<String>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let messages = state
        .chat
        .list_messages(&SessionId::from(session_id), &caller)
        .await?;
    Ok(Json(MessageListResponse {
        count: messages.len(),
        messages,
    }))
}

/// PUT /chat/{message_id}
pub async fn edit_message(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(message_id): Path<String>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<ChatMessage>, ApiError> {
    let request = body(payload)?;
    let message = state
        .chat
        .edit_message(
            &MessageId::from(message_id),
            &caller,
            EditMessage {
                content: request.content,
                attachments: request.attachments,
            },
        )
        .await?;
    Ok(Json(message))
}

/// PATCH /chat/{message_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(message_id): Path<String>,
) -> Result<Json<ChatMessage>, ApiError> {
    let message = state
        .chat
        .mark_message_read(&MessageId::from(message_id), &caller)
        .await?;
    Ok(Json(message))
}

/// PATCH /chat/{session_id}/readAll
pub async fn mark_all_read(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(session_id): Path<String>,
) -> Result<Json<ReadReceipt>, ApiError> {
    let receipt = state
        .chat
        .mark_all_messages_read(&SessionId::from(session_id), &caller)
        .await?;
    Ok(Json(receipt))
}

/// GET /notifications/unread
pub async fn unread_count(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<UnreadResponse>, ApiError> {
    let unread = state.chat.unread_count(&caller).await?;
    Ok(Json(UnreadResponse { unread }))
}

/// GET /health
///
/// Unauthenticated. 503 when any adapter reports unhealthy.
pub async fn health(State(state): State<AppState>) -> Response {
    let mut adapters = Vec::with_capacity(state.adapters.len());
    let mut worst = "ok";
    for adapter in state.adapters.iter() {
        let (status, detail) = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(reason)) => ("degraded", Some(reason)),
            Ok(HealthStatus::Unhealthy(reason)) => ("unhealthy", Some(reason)),
            Err(e) => ("unhealthy", Some(e.public_message())),
        };
        worst = match (worst, status) {
            (_, "unhealthy") | ("unhealthy", _) => "unhealthy",
            (_, "degraded") | ("degraded", _) => "degraded",
            _ => worst,
        };
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            status,
            detail,
        });
    }

    let code = if worst == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status: worst,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        adapters,
    };
    (code, Json(body)).into_response()
}
