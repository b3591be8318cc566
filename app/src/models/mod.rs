// order-relay/src/models/mod.rs

//! Order aggregate as it travels through the relay, plus the escalation payload.

pub mod escalation;
pub mod order;
pub mod order_item;

pub use escalation::EscalationMessage;
pub use order::Order;
pub use order_item::{CatalogItemOrdered, OrderItem};
