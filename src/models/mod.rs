pub mod address;
pub mod event;
pub mod order;
pub mod quote;
