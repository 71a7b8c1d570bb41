use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::engine::checkout::{place_order, PlaceOrderRequest};
use crate::engine::lifecycle::TransitionRequest;
use crate::error::AppError;
use crate::models::event::TransitionRecord;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:order_number", get(get_order))
        .route(
            "/orders/:order_number/transitions",
            post(transition_order).get(list_transitions),
        )
        .route(
            "/orders/:order_number/allowed-transitions",
            get(allowed_transitions),
        )
}

#[derive(Deserialize)]
pub struct TransitionBody {
    pub target_status: OrderStatus,
    pub actor_id: String,
    pub expected_version: u64,
}

#[derive(Serialize)]
pub struct AllowedTransitionsResponse {
    pub order_number: String,
    pub current: OrderStatus,
    pub version: u64,
    pub allowed: Vec<OrderStatus>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = place_order(&state.quotes, &state.lifecycle, payload).await?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .lifecycle
        .get(&order_number)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_number)))?;

    Ok(Json(order))
}

async fn transition_order(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
    Json(payload): Json<TransitionBody>,
) -> Result<Json<Order>, AppError> {
    if payload.actor_id.trim().is_empty() {
        return Err(AppError::BadRequest("actor_id cannot be empty".to_string()));
    }

    let order = state.lifecycle.transition(
        &order_number,
        TransitionRequest {
            target: payload.target_status,
            actor_id: payload.actor_id,
            expected_version: payload.expected_version,
        },
    )?;

    Ok(Json(order))
}

async fn list_transitions(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<Vec<TransitionRecord>>, AppError> {
    Ok(Json(state.lifecycle.history(&order_number)?))
}

async fn allowed_transitions(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<Json<AllowedTransitionsResponse>, AppError> {
    let (order, allowed) = state.lifecycle.allowed_next(&order_number)?;

    Ok(Json(AllowedTransitionsResponse {
        order_number: order.order_number,
        current: order.status,
        version: order.version,
        allowed,
    }))
}
