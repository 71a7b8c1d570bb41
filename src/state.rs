use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::engine::lifecycle::LifecycleManager;
use crate::engine::quotes::QuoteAggregator;
use crate::engine::stock::{InMemoryStockLedger, StockLedger};
use crate::geo::routing::RoutingClient;
use crate::geo::DistanceResolver;
use crate::models::event::OrderEvent;
use crate::observability::metrics::Metrics;
use crate::pricing::PricingTable;

pub struct AppState {
    pub quotes: QuoteAggregator,
    pub lifecycle: LifecycleManager,
    pub order_events_tx: broadcast::Sender<OrderEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        pricing: Arc<PricingTable>,
        routing: Option<Arc<dyn RoutingClient>>,
        routing_timeout: Duration,
        event_buffer_size: usize,
    ) -> Self {
        Self::with_stock_ledger(
            pricing,
            routing,
            routing_timeout,
            event_buffer_size,
            Arc::new(InMemoryStockLedger::new()),
        )
    }

    pub fn with_stock_ledger(
        pricing: Arc<PricingTable>,
        routing: Option<Arc<dyn RoutingClient>>,
        routing_timeout: Duration,
        event_buffer_size: usize,
        stock: Arc<dyn StockLedger>,
    ) -> Self {
        let metrics = Metrics::new();
        let (order_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        let resolver = DistanceResolver::new(routing, routing_timeout, metrics.clone());
        let quotes = QuoteAggregator::new(pricing, resolver, metrics.clone());
        let lifecycle = LifecycleManager::new(stock, order_events_tx.clone(), metrics.clone());

        Self {
            quotes,
            lifecycle,
            order_events_tx,
            metrics,
        }
    }
}
