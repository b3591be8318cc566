// order-relay/src/queue/mod.rs

//! In-process stand-in for the message-queue host that triggers the reservation
//! consumer.
//!
//! The queue owns delivery bookkeeping: it stamps each delivery with its count,
//! acknowledges settled messages, waits out the backoff before a redelivery and
//! dead-letters messages that exceed the delivery limit. Handlers only report how
//! a delivery went.

pub mod message;
pub mod retry;
pub mod runtime;

pub use message::{InboundMessage, MessageHandler, ReservationOutcome};
pub use retry::RetryPolicy;
pub use runtime::{DeadLetter, OrderQueue, QueueStatsSnapshot, QueueWorker};
