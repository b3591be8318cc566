// order-relay/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod queue_handlers;
