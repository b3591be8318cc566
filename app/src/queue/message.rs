// order-relay/src/queue/message.rs

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One delivery of a queued message.
///
/// `delivery_count` is 1 on the first delivery and grows by one on every redelivery of
/// the same message. It is the only attempt counter in the system, so two messages
/// never share one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
  pub message_id: Uuid,
  pub body: String,
  pub delivery_count: u32,
  pub enqueued_at: DateTime<Utc>,
}

impl InboundMessage {
  pub fn new(body: impl Into<String>) -> Self {
    Self {
      message_id: Uuid::new_v4(),
      body: body.into(),
      delivery_count: 1,
      enqueued_at: Utc::now(),
    }
  }

  /// The same message, as handed out on its next delivery.
  pub fn redelivered(&self) -> Self {
    Self {
      delivery_count: self.delivery_count.saturating_add(1),
      ..self.clone()
    }
  }
}

/// How a delivery ended when the handler did not ask for a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReservationOutcome {
  Stored { object_key: String },
  /// Retries ran out and the workflow channel was notified.
  Escalated,
  /// Settled off the main queue without escalation (e.g. an unreadable payload).
  DeadLettered { reason: String },
}

/// Invoked by the queue for every delivery. `Ok` settles the message; `Err` asks the
/// queue to deliver it again later.
#[async_trait]
pub trait MessageHandler: Send + Sync {
  async fn handle(&self, message: &InboundMessage) -> Result<ReservationOutcome>;
}
