use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::address::Address;
use crate::models::quote::VehicleType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Ordered,
    PaidWaitingApproval,
    CodWaitingApproval,
    PaidReadyPickup,
    Processing,
    InTransit,
    WaitingClient,
    Delivered,
    PickedUp,
    Completed,
    Cancelled,
    ReturnRequested,
    ReturnApproved,
    Returned,
    RefundRequested,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 16] = [
        OrderStatus::Ordered,
        OrderStatus::PaidWaitingApproval,
        OrderStatus::CodWaitingApproval,
        OrderStatus::PaidReadyPickup,
        OrderStatus::Processing,
        OrderStatus::InTransit,
        OrderStatus::WaitingClient,
        OrderStatus::Delivered,
        OrderStatus::PickedUp,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::ReturnRequested,
        OrderStatus::ReturnApproved,
        OrderStatus::Returned,
        OrderStatus::RefundRequested,
        OrderStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "ordered",
            OrderStatus::PaidWaitingApproval => "paid_waiting_approval",
            OrderStatus::CodWaitingApproval => "cod_waiting_approval",
            OrderStatus::PaidReadyPickup => "paid_ready_pickup",
            OrderStatus::Processing => "processing",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::WaitingClient => "waiting_client",
            OrderStatus::Delivered => "delivered",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::ReturnRequested => "return_requested",
            OrderStatus::ReturnApproved => "return_approved",
            OrderStatus::Returned => "returned",
            OrderStatus::RefundRequested => "refund_requested",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Delivery,
    StorePickup,
}

impl ShippingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Delivery => "delivery",
            ShippingMethod::StorePickup => "store_pickup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    EWallet,
    Card,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<Address>,
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub total_amount: f64,
    pub shipping_method: ShippingMethod,
    pub vehicle_type: Option<VehicleType>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

/// `ORD-YYYYMMDD-XXXXXXXX`, upper-case hex taken from a fresh v4 uuid.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_number_carries_date_and_random_suffix() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
        let first = generate_order_number(now);
        let second = generate_order_number(now);

        assert!(first.starts_with("ORD-20260309-"));
        assert_eq!(first.len(), "ORD-20260309-".len() + 8);
        assert_ne!(first, second);
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaidWaitingApproval).unwrap();
        assert_eq!(json, "\"paid_waiting_approval\"");
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn line_total_multiplies_quantity() {
        let item = OrderItem {
            product_id: "sku-1".to_string(),
            name: "Rice cooker".to_string(),
            quantity: 3,
            unit_price: 1499.5,
        };
        assert_eq!(round_currency(item.line_total()), 4498.5);
    }
}
