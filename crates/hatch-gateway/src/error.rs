// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API error type and its HTTP mapping.
//!
//! Client errors carry their message to the caller. Server errors are logged
//! with full detail and answered with a generic body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hatch_core::HatchError;
use serde::Serialize;
use thiserror::Error;

/// One failing field in a request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors returned by gateway handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body was not a JSON object of the expected shape.
    #[error("invalid payload: {0}")]
    MalformedBody(String),

    /// One or more fields failed validation.
    #[error("invalid request input")]
    Validation(Vec<FieldError>),

    /// The conversation id in the path is not an integer.
    #[error("invalid conversation id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Hatch(#[from] HatchError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Hatch(err) => match err {
                HatchError::NotFound { .. } => StatusCode::NOT_FOUND,
                HatchError::UnknownType(_) => StatusCode::UNPROCESSABLE_ENTITY,
                HatchError::DeliveryTerminal { .. } => StatusCode::BAD_GATEWAY,
                HatchError::DeliveryExhausted { .. } | HatchError::Cancelled => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                HatchError::Config(_)
                | HatchError::Storage { .. }
                | HatchError::Transport { .. }
                | HatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// The message shown to the caller.
    fn public_message(&self) -> String {
        match self {
            Self::Hatch(HatchError::DeliveryTerminal { .. }) => {
                "provider rejected the message".to_string()
            }
            Self::Hatch(HatchError::DeliveryExhausted { .. }) => {
                "provider unavailable, message not sent".to_string()
            }
            Self::Hatch(HatchError::Cancelled) => "server is shutting down".to_string(),
            _ if self.status_code().is_server_error() => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self, status: StatusCode) {
        match self {
            Self::Hatch(err) if status.is_server_error() => {
                let cause = std::error::Error::source(err).map(|s| s.to_string());
                tracing::error!(
                    error = %err,
                    stage = ?err.stage(),
                    attempts = err.delivery_attempts(),
                    cause = cause.as_deref(),
                    status = status.as_u16(),
                    "request failed"
                );
            }
            other => {
                tracing::debug!(error = %other, status = status.as_u16(), "client error");
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.log(status);
        let error = self.public_message();
        let fields = match self {
            Self::Validation(fields) => fields,
            _ => Vec::new(),
        };
        (status, Json(ErrorResponse { error, fields })).into_response()
    }
}
