// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the chat API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    middleware as axum_middleware,
    routing::{get, patch},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use helpmate_chat::ChatService;
use helpmate_config::model::ServerConfig;
use helpmate_core::{HelpmateError, PluginAdapter};

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub auth: AuthConfig,
    /// Adapters reported by `GET /health`.
    pub adapters: Arc<Vec<Arc<dyn PluginAdapter>>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        chat: Arc<ChatService>,
        server: &ServerConfig,
        adapters: Vec<Arc<dyn PluginAdapter>>,
    ) -> Self {
        Self {
            chat,
            auth: AuthConfig {
                cookie_name: server.cookie_name.clone(),
                secret: server.auth_secret.clone(),
            },
            adapters: Arc::new(adapters),
            started_at: Instant::now(),
        }
    }
}

/// Builds the full router:
/// - `GET /health` (public)
/// - `POST|GET|PUT /chat/{id}`, `PATCH /chat/{id}/read`,
///   `PATCH /chat/{id}/readAll`, `GET /notifications/unread` (authenticated)
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone());

    // `{id}` is a session id for POST/GET and a message id for PUT.
    let api_routes = Router::new()
        .route(
            "/chat/{id}",
            get(handlers::list_messages)
                .post(handlers::send_message)
                .put(handlers::edit_message),
        )
        .route("/chat/{id}/read", patch(handlers::mark_read))
        .route("/chat/{id}/readAll", patch(handlers::mark_all_read))
        .route("/notifications/unread", get(handlers::unread_count))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(request_timeout))
            .layer(CorsLayer::permissive()),
    )
}

/// Binds `host:port` and serves until `cancel` fires, then drains in-flight
/// requests.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), HelpmateError> {
    if state.auth.secret.is_none() {
        tracing::warn!("no auth secret configured; all chat routes will answer 401");
    }
    let app = build_router(state, Duration::from_secs(config.request_timeout_secs));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HelpmateError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(addr = %addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| HelpmateError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
