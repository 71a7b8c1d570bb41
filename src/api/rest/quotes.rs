use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::models::address::Address;
use crate::models::quote::DeliveryOptions;
use crate::pricing::PricingTable;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", post(get_quotes))
        .route("/pricing", get(get_pricing))
}

async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Json(address): Json<Address>,
) -> Json<DeliveryOptions> {
    Json(state.quotes.get_quotes(&address).await)
}

async fn get_pricing(State(state): State<Arc<AppState>>) -> Json<PricingTable> {
    Json(state.quotes.table().clone())
}
