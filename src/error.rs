use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::order::OrderStatus;
use crate::pricing::PricingError;

/// Rejected lifecycle transitions. Every variant carries the status the
/// order was in and the status that was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionError {
    #[error("invalid transition from {current} to {attempted}")]
    InvalidTransition {
        current: OrderStatus,
        attempted: OrderStatus,
    },

    #[error("order in {current} can no longer be cancelled (attempted {attempted})")]
    NotCancellable {
        current: OrderStatus,
        attempted: OrderStatus,
    },

    #[error("order in {current} is not eligible for {attempted}")]
    NotEligibleForReturn {
        current: OrderStatus,
        attempted: OrderStatus,
    },

    #[error(
        "order moved to {current} (version {actual_version}) before {attempted} was applied on version {expected_version}"
    )]
    ConflictingTransition {
        current: OrderStatus,
        attempted: OrderStatus,
        expected_version: u64,
        actual_version: u64,
    },

    #[error("side effect for {current} -> {attempted} failed: {reason}")]
    SideEffectFailed {
        current: OrderStatus,
        attempted: OrderStatus,
        reason: String,
    },
}

impl TransitionError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionError::InvalidTransition { .. } => "invalid_transition",
            TransitionError::NotCancellable { .. } => "not_cancellable",
            TransitionError::NotEligibleForReturn { .. } => "not_eligible_for_return",
            TransitionError::ConflictingTransition { .. } => "conflicting_transition",
            TransitionError::SideEffectFailed { .. } => "side_effect_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Transition(err) = &self {
            let status = match err {
                TransitionError::ConflictingTransition { .. } => StatusCode::CONFLICT,
                TransitionError::SideEffectFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            let body = Json(json!({
                "error": err.to_string(),
                "details": err,
            }));
            return (status, body).into_response();
        }

        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Pricing(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Transition(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
