// order-relay/src/services/bus_publisher.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::http_client::{OutboundHttp, OutboundReply, OutboundRequest};
use crate::services::sas_signer::{self, PUBLISH_TOKEN_TTL};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Sends serialized orders to the bus and to the delivery processor.
#[derive(Clone)]
pub struct EventPublisher {
  http: Arc<dyn OutboundHttp>,
  config: Arc<AppConfig>,
}

impl EventPublisher {
  pub fn new(http: Arc<dyn OutboundHttp>, config: Arc<AppConfig>) -> Self {
    Self { http, config }
  }

  /// Posts `body` to the bus with a freshly signed 24 hour token.
  ///
  /// Any transport failure or non-2xx reply is an `AppError::Publish`; the caller must
  /// treat it as the end of the order-creation request.
  #[instrument(name = "publisher::publish", skip(self, body), fields(endpoint = %self.config.bus.endpoint), err(Display))]
  pub async fn publish(&self, body: &[u8]) -> Result<OutboundReply> {
    let bus = &self.config.bus;
    let token = sas_signer::sign(&bus.endpoint, &bus.key_name, &bus.key, PUBLISH_TOKEN_TTL)?;
    let request = OutboundRequest::new(bus.endpoint.clone(), body.to_vec()).with_authorization(token);

    let reply = self
      .http
      .post_json(request)
      .await
      .map_err(|e| AppError::Publish(format!("bus unreachable: {}", e)))?;
    info!(status = reply.status, response = %reply.body, "Bus answered order publish.");
    if !reply.is_success() {
      return Err(AppError::Publish(format!("bus replied {}: {}", reply.status, reply.body)));
    }
    Ok(reply)
  }

  /// Posts `body`, unauthenticated, to the delivery processor.
  #[instrument(name = "publisher::trigger_downstream", skip(self, body), err(Display))]
  pub async fn trigger_downstream(&self, body: &[u8]) -> Result<OutboundReply> {
    let Some(endpoint) = self.config.delivery_processor_endpoint.as_deref() else {
      return Err(AppError::DownstreamTrigger(
        "DELIVERY_ORDER_PROCESSOR_ENDPOINT is not configured".to_string(),
      ));
    };

    let reply = self
      .http
      .post_json(OutboundRequest::new(endpoint, body.to_vec()))
      .await
      .map_err(|e| AppError::DownstreamTrigger(e.to_string()))?;
    info!(status = reply.status, response = %reply.body, "Delivery processor answered.");
    if !reply.is_success() {
      warn!(status = reply.status, "Delivery processor rejected the order.");
      return Err(AppError::DownstreamTrigger(format!(
        "delivery processor replied {}: {}",
        reply.status, reply.body
      )));
    }
    Ok(reply)
  }
}
