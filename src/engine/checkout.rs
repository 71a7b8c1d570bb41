use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle::LifecycleManager;
use crate::engine::quotes::QuoteAggregator;
use crate::error::AppError;
use crate::models::address::Address;
use crate::models::order::{
    generate_order_number, round_currency, Order, OrderItem, OrderStatus, PaymentMethod,
    PaymentStatus, ShippingMethod,
};
use crate::models::quote::VehicleType;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItem>,
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

fn validate_items(items: &[OrderItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("order must contain at least one item".to_string()));
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(AppError::BadRequest("product_id cannot be empty".to_string()));
        }
        if item.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "quantity for {} must be > 0",
                item.product_id
            )));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(AppError::BadRequest(format!(
                "unit_price for {} must be >= 0",
                item.product_id
            )));
        }
    }
    Ok(())
}

/// Prices the chosen shipping option against a fresh quote (client-side
/// fares are never trusted) and hands the new order to the lifecycle manager.
pub async fn place_order(
    quotes: &QuoteAggregator,
    lifecycle: &LifecycleManager,
    request: PlaceOrderRequest,
) -> Result<Order, AppError> {
    validate_items(&request.items)?;

    let (shipping_fee, vehicle_type) = match request.shipping_method {
        ShippingMethod::StorePickup => (0.0, None),
        ShippingMethod::Delivery => {
            let address = request.shipping_address.as_ref().ok_or_else(|| {
                AppError::BadRequest("delivery orders need a shipping_address".to_string())
            })?;
            let vehicle_type = match request.vehicle_type {
                Some(VehicleType::StorePickup) | None => {
                    return Err(AppError::BadRequest(
                        "delivery orders need a delivery vehicle_type".to_string(),
                    ));
                }
                Some(vehicle_type) => vehicle_type,
            };

            let options = quotes.get_quotes(address).await;
            let quote = options.quote_for(vehicle_type).ok_or_else(|| {
                AppError::BadRequest(format!("vehicle {vehicle_type} is not offered"))
            })?;
            (quote.total_fare as f64, Some(vehicle_type))
        }
    };

    let subtotal = round_currency(request.items.iter().map(OrderItem::line_total).sum());
    let now = Utc::now();

    let order = Order {
        id: Uuid::new_v4(),
        order_number: generate_order_number(now),
        items: request.items,
        shipping_address: request.shipping_address,
        subtotal,
        shipping_fee,
        total_amount: round_currency(subtotal + shipping_fee),
        shipping_method: request.shipping_method,
        vehicle_type,
        payment_method: request.payment_method,
        payment_status: request.payment_status.unwrap_or(PaymentStatus::Pending),
        status: OrderStatus::Ordered,
        tracking_number: None,
        version: 0,
        created_at: now,
    };

    lifecycle.place(order)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use super::*;
    use crate::engine::stock::InMemoryStockLedger;
    use crate::geo::DistanceResolver;
    use crate::observability::metrics::Metrics;
    use crate::pricing::PricingTable;

    fn setup() -> (QuoteAggregator, LifecycleManager) {
        let metrics = Metrics::new();
        let quotes = QuoteAggregator::new(
            Arc::new(PricingTable::default()),
            DistanceResolver::offline(metrics.clone()),
            metrics.clone(),
        );
        let (tx, _rx) = broadcast::channel(16);
        let lifecycle = LifecycleManager::new(Arc::new(InMemoryStockLedger::new()), tx, metrics);
        (quotes, lifecycle)
    }

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem {
                product_id: "rice-cooker".to_string(),
                name: "Rice Cooker".to_string(),
                quantity: 1,
                unit_price: 1899.0,
            },
            OrderItem {
                product_id: "extension-cord".to_string(),
                name: "Extension Cord".to_string(),
                quantity: 2,
                unit_price: 249.5,
            },
        ]
    }

    fn cavite_address() -> Address {
        Address {
            street_address: "Blk 3 Lot 9".to_string(),
            city: "Bacoor".to_string(),
            province: "Cavite".to_string(),
            zip_code: "4102".to_string(),
            lat: None,
            lng: None,
        }
    }

    #[tokio::test]
    async fn delivery_order_is_priced_from_server_quote() {
        let (quotes, lifecycle) = setup();
        let order = place_order(
            &quotes,
            &lifecycle,
            PlaceOrderRequest {
                items: items(),
                shipping_method: ShippingMethod::Delivery,
                vehicle_type: Some(VehicleType::Motorcycle),
                shipping_address: Some(cavite_address()),
                payment_method: PaymentMethod::CashOnDelivery,
                payment_status: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(order.status, OrderStatus::Ordered);
        assert_eq!(order.subtotal, 2398.0);
        // 8 km flat Cavite estimate on a motorcycle
        assert_eq!(order.shipping_fee, 126.0);
        assert_eq!(order.total_amount, 2524.0);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(lifecycle.get(&order.order_number).unwrap().id, order.id);
    }

    #[tokio::test]
    async fn pickup_order_has_no_shipping_fee() {
        let (quotes, lifecycle) = setup();
        let order = place_order(
            &quotes,
            &lifecycle,
            PlaceOrderRequest {
                items: items(),
                shipping_method: ShippingMethod::StorePickup,
                vehicle_type: Some(VehicleType::Sedan),
                shipping_address: None,
                payment_method: PaymentMethod::EWallet,
                payment_status: Some(PaymentStatus::Paid),
            },
        )
        .await
        .unwrap();

        assert_eq!(order.shipping_fee, 0.0);
        assert_eq!(order.vehicle_type, None);
        assert_eq!(order.total_amount, order.subtotal);
    }

    #[tokio::test]
    async fn delivery_without_address_or_vehicle_is_rejected() {
        let (quotes, lifecycle) = setup();
        let base = PlaceOrderRequest {
            items: items(),
            shipping_method: ShippingMethod::Delivery,
            vehicle_type: Some(VehicleType::Motorcycle),
            shipping_address: None,
            payment_method: PaymentMethod::Card,
            payment_status: None,
        };
        assert!(matches!(
            place_order(&quotes, &lifecycle, base.clone()).await,
            Err(AppError::BadRequest(_))
        ));

        let no_vehicle = PlaceOrderRequest {
            vehicle_type: Some(VehicleType::StorePickup),
            shipping_address: Some(cavite_address()),
            ..base
        };
        assert!(matches!(
            place_order(&quotes, &lifecycle, no_vehicle).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(lifecycle.is_empty());
    }

    #[tokio::test]
    async fn empty_or_zero_quantity_items_are_rejected() {
        let (quotes, lifecycle) = setup();
        let mut bad_items = items();
        bad_items[0].quantity = 0;

        for items in [Vec::new(), bad_items] {
            let result = place_order(
                &quotes,
                &lifecycle,
                PlaceOrderRequest {
                    items,
                    shipping_method: ShippingMethod::StorePickup,
                    vehicle_type: None,
                    shipping_address: None,
                    payment_method: PaymentMethod::CashOnDelivery,
                    payment_status: None,
                },
            )
            .await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }
}
