pub mod checkout;
pub mod lifecycle;
pub mod quotes;
pub mod stock;
pub mod transitions;
