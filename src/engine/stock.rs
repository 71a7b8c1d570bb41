use dashmap::DashMap;
use thiserror::Error;

use crate::models::order::OrderItem;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("stock ledger unavailable: {0}")]
    Unavailable(String),

    #[error("order {0} already holds a reservation")]
    AlreadyReserved(String),
}

/// Inventory hooks fired by placement and lifecycle transitions. Calls run
/// while the order entry is locked, so implementations must not reach back
/// into the order book.
pub trait StockLedger: Send + Sync {
    fn reserve(&self, order_number: &str, items: &[OrderItem]) -> Result<(), StockError>;

    fn release(&self, order_number: &str) -> Result<(), StockError>;

    fn restock(&self, order_number: &str, items: &[OrderItem]) -> Result<(), StockError>;
}

#[derive(Default)]
pub struct InMemoryStockLedger {
    reservations: DashMap<String, Vec<OrderItem>>,
    returned_units: DashMap<String, u64>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserved_units(&self, product_id: &str) -> u64 {
        self.reservations
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|item| item.product_id == product_id)
                    .map(|item| u64::from(item.quantity))
                    .collect::<Vec<_>>()
            })
            .sum()
    }

    pub fn returned_units(&self, product_id: &str) -> u64 {
        self.returned_units
            .get(product_id)
            .map(|units| *units)
            .unwrap_or(0)
    }

    pub fn has_reservation(&self, order_number: &str) -> bool {
        self.reservations.contains_key(order_number)
    }
}

impl StockLedger for InMemoryStockLedger {
    fn reserve(&self, order_number: &str, items: &[OrderItem]) -> Result<(), StockError> {
        if self.reservations.contains_key(order_number) {
            return Err(StockError::AlreadyReserved(order_number.to_string()));
        }
        self.reservations
            .insert(order_number.to_string(), items.to_vec());
        Ok(())
    }

    /// Releasing an order with no reservation is a no-op.
    fn release(&self, order_number: &str) -> Result<(), StockError> {
        self.reservations.remove(order_number);
        Ok(())
    }

    fn restock(&self, order_number: &str, items: &[OrderItem]) -> Result<(), StockError> {
        self.reservations.remove(order_number);
        for item in items {
            *self
                .returned_units
                .entry(item.product_id.clone())
                .or_insert(0) += u64::from(item.quantity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: product_id.to_string(),
            name: product_id.to_uppercase(),
            quantity,
            unit_price: 100.0,
        }
    }

    #[test]
    fn reservations_are_tracked_per_order() {
        let ledger = InMemoryStockLedger::new();
        ledger.reserve("ORD-1", &[item("fan", 2), item("kettle", 1)]).unwrap();
        ledger.reserve("ORD-2", &[item("fan", 3)]).unwrap();

        assert_eq!(ledger.reserved_units("fan"), 5);

        ledger.release("ORD-1").unwrap();
        assert_eq!(ledger.reserved_units("fan"), 3);
        assert_eq!(ledger.reserved_units("kettle"), 0);
        assert!(!ledger.has_reservation("ORD-1"));
    }

    #[test]
    fn double_reservation_is_rejected() {
        let ledger = InMemoryStockLedger::new();
        ledger.reserve("ORD-1", &[item("fan", 1)]).unwrap();
        assert!(matches!(
            ledger.reserve("ORD-1", &[item("fan", 1)]),
            Err(StockError::AlreadyReserved(_))
        ));
    }

    #[test]
    fn restock_counts_returned_units() {
        let ledger = InMemoryStockLedger::new();
        ledger.restock("ORD-1", &[item("fan", 2)]).unwrap();
        ledger.restock("ORD-2", &[item("fan", 1)]).unwrap();
        assert_eq!(ledger.returned_units("fan"), 3);
    }
}
