// order-relay/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of the catalog entry taken when the order was created, so later catalog
/// edits cannot change a historical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemOrdered {
  pub catalog_item_id: i32,
  pub product_name: String,
  pub picture_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: i32,
  pub item_ordered: CatalogItemOrdered,
  #[serde(with = "rust_decimal::serde::arbitrary_precision")]
  pub unit_price: Decimal,
  pub units: i32,
}
