// order-relay/src/models/escalation.rs

use crate::models::order::Order;
use serde::{Deserialize, Serialize};

/// Body posted to the workflow webhook when an order could not be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationMessage {
  pub message: String,
  pub order: Order,
}

impl EscalationMessage {
  pub fn persistence_failed(order: Order, reason: &str) -> Self {
    Self {
      message: format!(
        "Could not save order in blob storage. Order details Id: {}. Reason: {}",
        order.id, reason
      ),
      order,
    }
  }
}
