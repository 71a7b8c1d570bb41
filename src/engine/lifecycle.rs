use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::engine::stock::{StockError, StockLedger};
use crate::engine::transitions::{self, SideEffect};
use crate::error::{AppError, TransitionError};
use crate::models::event::{OrderEvent, TransitionRecord};
use crate::models::order::{Order, OrderStatus};
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub target: OrderStatus,
    pub actor_id: String,
    /// Version the caller last read. A mismatch fails with
    /// `ConflictingTransition`.
    pub expected_version: u64,
}

/// Owns the order book. Status only changes through [`LifecycleManager::transition`].
pub struct LifecycleManager {
    orders: DashMap<String, Order>,
    history: DashMap<String, Vec<TransitionRecord>>,
    stock: Arc<dyn StockLedger>,
    events_tx: broadcast::Sender<OrderEvent>,
    metrics: Metrics,
}

impl LifecycleManager {
    pub fn new(
        stock: Arc<dyn StockLedger>,
        events_tx: broadcast::Sender<OrderEvent>,
        metrics: Metrics,
    ) -> Self {
        Self {
            orders: DashMap::new(),
            history: DashMap::new(),
            stock,
            events_tx,
            metrics,
        }
    }

    /// Stores a freshly placed order and reserves its stock. The order must
    /// be in `ordered`.
    pub fn place(&self, order: Order) -> Result<Order, AppError> {
        if order.status != OrderStatus::Ordered {
            return Err(AppError::BadRequest(format!(
                "new orders must start in ordered, got {}",
                order.status
            )));
        }

        match self.orders.entry(order.order_number.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "order {} already exists",
                order.order_number
            ))),
            Entry::Vacant(slot) => {
                self.stock
                    .reserve(&order.order_number, &order.items)
                    .map_err(|err| AppError::Internal(format!("stock reservation failed: {err}")))?;
                slot.insert(order.clone());

                self.metrics
                    .orders_placed_total
                    .with_label_values(&[order.shipping_method.as_str()])
                    .inc();
                let _ = self.events_tx.send(OrderEvent::Placed {
                    id: order.id,
                    order_number: order.order_number.clone(),
                    status: order.status,
                    at: Utc::now(),
                });
                info!(
                    order_number = %order.order_number,
                    shipping_method = order.shipping_method.as_str(),
                    total = order.total_amount,
                    "order placed"
                );

                Ok(order)
            }
        }
    }

    pub fn get(&self, order_number: &str) -> Option<Order> {
        self.orders.get(order_number).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn history(&self, order_number: &str) -> Result<Vec<TransitionRecord>, AppError> {
        if !self.orders.contains_key(order_number) {
            return Err(not_found(order_number));
        }
        Ok(self
            .history
            .get(order_number)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }

    /// The order together with the statuses it can move to, read under one
    /// entry guard so both halves describe the same version.
    pub fn allowed_next(
        &self,
        order_number: &str,
    ) -> Result<(Order, Vec<OrderStatus>), AppError> {
        let entry = self
            .orders
            .get(order_number)
            .ok_or_else(|| not_found(order_number))?;
        let order = entry.value();
        Ok((order.clone(), transitions::allowed_next(order)))
    }

    /// Validates and applies one transition. The order entry stays locked
    /// for the whole call, so concurrent requests on one order run one at a
    /// time; stock hooks run before the new status is written and a hook
    /// failure leaves the order untouched.
    pub fn transition(
        &self,
        order_number: &str,
        request: TransitionRequest,
    ) -> Result<Order, AppError> {
        let mut entry = self
            .orders
            .get_mut(order_number)
            .ok_or_else(|| not_found(order_number))?;

        let mut next = entry.value().clone();
        let record = match transitions::apply(
            &mut next,
            request.target,
            &request.actor_id,
            request.expected_version,
        ) {
            Ok(record) => record,
            Err(err) => {
                self.record_outcome(err.kind());
                warn!(
                    order_number = %order_number,
                    actor = %request.actor_id,
                    error = %err,
                    "transition rejected"
                );
                return Err(err.into());
            }
        };

        if let Some(effect) = transitions::side_effect(record.to) {
            if let Err(err) = self.run_side_effect(effect, &next) {
                self.record_outcome("side_effect_failed");
                error!(
                    order_number = %order_number,
                    from = %record.from,
                    to = %record.to,
                    error = %err,
                    "transition side effect failed; status unchanged"
                );
                return Err(TransitionError::SideEffectFailed {
                    current: record.from,
                    attempted: record.to,
                    reason: err.to_string(),
                }
                .into());
            }
        }

        *entry.value_mut() = next.clone();
        self.history
            .entry(order_number.to_string())
            .or_default()
            .push(record.clone());
        drop(entry);

        self.record_outcome("success");
        info!(
            order_number = %order_number,
            actor = %record.actor_id,
            from = %record.from,
            to = %record.to,
            version = record.version,
            "order status changed"
        );
        let _ = self.events_tx.send(OrderEvent::StatusChanged(record));

        Ok(next)
    }

    fn run_side_effect(&self, effect: SideEffect, order: &Order) -> Result<(), StockError> {
        match effect {
            SideEffect::ReleaseStock => self.stock.release(&order.order_number),
            SideEffect::Restock => self.stock.restock(&order.order_number, &order.items),
        }
    }

    fn record_outcome(&self, outcome: &str) {
        self.metrics
            .transitions_total
            .with_label_values(&[outcome])
            .inc();
    }
}

fn not_found(order_number: &str) -> AppError {
    AppError::NotFound(format!("order {order_number} not found"))
}
