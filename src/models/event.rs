use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub order_number: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor_id: String,
    pub version: u64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed {
        id: Uuid,
        order_number: String,
        status: OrderStatus,
        at: DateTime<Utc>,
    },
    StatusChanged(TransitionRecord),
}

impl OrderEvent {
    pub fn order_number(&self) -> &str {
        match self {
            OrderEvent::Placed { order_number, .. } => order_number,
            OrderEvent::StatusChanged(record) => &record.order_number,
        }
    }
}
