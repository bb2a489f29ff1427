// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use hatch_config::model::ServerConfig;
use hatch_core::HatchError;
use hatch_intake::IntakeService;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub intake: Arc<IntakeService>,
    /// Fired when in-flight work must stop. Each request runs under a
    /// child token.
    pub cancel: CancellationToken,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(intake: Arc<IntakeService>, cancel: CancellationToken) -> Self {
        Self {
            intake,
            cancel,
            start_time: Instant::now(),
        }
    }
}

/// Build the application router with tracing and request-id middleware.
pub fn router(state: GatewayState) -> Router {
    let api_routes = Router::new()
        .route("/api/messages/sms", post(handlers::post_text_message))
        .route("/api/webhooks/sms", post(handlers::post_text_webhook))
        .route("/api/messages/email", post(handlers::post_email_message))
        .route("/api/webhooks/email", post(handlers::post_email_webhook))
        .route("/api/conversations", get(handlers::get_conversations))
        .route(
            "/api/conversations/{id}/messages",
            get(handlers::get_conversation_messages),
        );

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(handlers::get_health))
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Serves until `shutdown` fires, then stops accepting connections and waits
/// for in-flight requests. Cancel `state.cancel` to cut those short.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), HatchError> {
    let app = router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HatchError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| HatchError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
