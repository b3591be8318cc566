// order-relay/src/models/order.rs

use crate::models::order_item::OrderItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A validated, complete order. Never mutated once it has been published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: i32,
  pub order_items: Vec<OrderItem>,
  #[serde(with = "rust_decimal::serde::arbitrary_precision")]
  pub total_cost: Decimal,
}

impl Order {
  pub fn contains_catalog_item(&self, catalog_item_id: i32) -> bool {
    self
      .order_items
      .iter()
      .any(|item| item.item_ordered.catalog_item_id == catalog_item_id)
  }

  /// Canonical JSON form published to the bus and stored by the reserver.
  pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(self)
  }

  pub fn from_json_slice(payload: &[u8]) -> serde_json::Result<Self> {
    serde_json::from_slice(payload)
  }
}
