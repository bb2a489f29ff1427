// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the message and conversation API.

use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use hatch_core::{Conversation, ConversationId, Direction, HealthStatus};
use serde::Serialize;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ApiError;
use crate::payload::{MessagePayload, RouteKind};
use crate::server::GatewayState;

/// Response body for an accepted message.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub status: &'static str,
    pub message_id: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded`, or `unhealthy`.
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: u64,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<HealthStatus> for ComponentHealth {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => Self {
                status: "healthy",
                detail: None,
            },
            HealthStatus::Degraded(detail) => Self {
                status: "degraded",
                detail: Some(detail),
            },
            HealthStatus::Unhealthy(detail) => Self {
                status: "unhealthy",
                detail: Some(detail),
            },
        }
    }
}

async fn ingest(
    state: &GatewayState,
    direction: Direction,
    route: RouteKind,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
    let descriptor = payload.into_descriptor(route)?;

    // Cancellation aborts pending retries and uncommitted writes.
    let (cancel, _cancel_on_drop) = request_scope(&state.cancel);
    let message_id = state
        .intake
        .intake_with_cancel(direction, &descriptor, &cancel)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            status: "received",
            message_id: message_id.to_string(),
        }),
    ))
}

/// Token for one request: fired by server shutdown, or when the returned
/// guard drops because the client went away before the handler finished.
fn request_scope(shutdown: &CancellationToken) -> (CancellationToken, DropGuard) {
    let token = shutdown.child_token();
    let guard = token.clone().drop_guard();
    (token, guard)
}

/// POST /api/messages/sms
///
/// Sends an SMS or MMS through the text provider, then stores it.
pub async fn post_text_message(
    State(state): State<GatewayState>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    ingest(&state, Direction::Outbound, RouteKind::Text, payload).await
}

/// POST /api/webhooks/sms
///
/// Stores an SMS or MMS the provider already delivered.
pub async fn post_text_webhook(
    State(state): State<GatewayState>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    ingest(&state, Direction::Inbound, RouteKind::Text, payload).await
}

/// POST /api/messages/email
pub async fn post_email_message(
    State(state): State<GatewayState>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    ingest(&state, Direction::Outbound, RouteKind::Email, payload).await
}

/// POST /api/webhooks/email
pub async fn post_email_webhook(
    State(state): State<GatewayState>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    ingest(&state, Direction::Inbound, RouteKind::Email, payload).await
}

/// GET /api/conversations
///
/// Every conversation with its participants, newest first. Messages are
/// omitted.
pub async fn get_conversations(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    Ok(Json(state.intake.list_conversations().await?))
}

/// GET /api/conversations/{id}/messages
pub async fn get_conversation_messages(
    State(state): State<GatewayState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Conversation>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::InvalidId(e.body_text()))?;
    Ok(Json(state.intake.get_conversation(ConversationId(id)).await?))
}

/// GET /health
///
/// 200 unless a component is unhealthy, in which case 503.
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let components: BTreeMap<String, ComponentHealth> = state
        .intake
        .health()
        .await
        .into_iter()
        .map(|(name, status)| (name, ComponentHealth::from(status)))
        .collect();

    let status = if components.values().any(|c| c.status == "unhealthy") {
        "unhealthy"
    } else if components.values().any(|c| c.status == "degraded") {
        "degraded"
    } else {
        "ok"
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
            components,
        }),
    )
}
