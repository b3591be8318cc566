// order-relay/src/pipelines/contexts.rs

//! Context data for the relay's pipelines. Handlers receive these wrapped in
//! `relay_flow::ContextData`.

use crate::errors::Result;
use crate::models::order::Order;
use crate::queue::InboundMessage;
use crate::services::http_client::OutboundReply;
use crate::state::AppState;
use crate::storage::BlobProperties;
use tokio::task::JoinHandle;

/// Spawned delivery-processor call. Resolves to the reply, or to the error that was
/// already logged inside the task.
pub type DownstreamTask = JoinHandle<Result<OutboundReply>>;

pub struct PublishCtxData {
  pub app_state: AppState,
  pub order: Order,
  pub payload: Option<Vec<u8>>,
  pub bus_status: Option<u16>,
  pub downstream: Option<DownstreamTask>,
}

impl PublishCtxData {
  pub fn new(app_state: AppState, order: Order) -> Self {
    Self {
      app_state,
      order,
      payload: None,
      bus_status: None,
      downstream: None,
    }
  }
}

#[derive(Clone)]
pub struct ReservationCtxData {
  pub app_state: AppState,
  pub message: InboundMessage,
  pub order: Option<Order>,
  pub container_created: bool,
  pub object_key: Option<String>,
  pub stored: Option<BlobProperties>,
}

impl ReservationCtxData {
  pub fn new(app_state: AppState, message: InboundMessage) -> Self {
    Self {
      app_state,
      message,
      order: None,
      container_created: false,
      object_key: None,
      stored: None,
    }
  }
}
