// order-relay/src/services/escalation.rs

use crate::errors::AppError;
use crate::models::escalation::EscalationMessage;
use crate::services::http_client::{OutboundHttp, OutboundRequest};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Last-resort signal to the workflow webhook once a message has run out of retries.
#[derive(Clone)]
pub struct EscalationNotifier {
  http: Arc<dyn OutboundHttp>,
  webhook_uri: Option<String>,
}

impl EscalationNotifier {
  pub fn new(http: Arc<dyn OutboundHttp>, webhook_uri: Option<String>) -> Self {
    Self { http, webhook_uri }
  }

  /// Posts `message` to the webhook. Never fails: problems are logged and reported
  /// through the returned flag only.
  #[instrument(name = "escalation::notify", skip_all, fields(order_id = message.order.id))]
  pub async fn notify(&self, message: &EscalationMessage) -> bool {
    match self.try_notify(message).await {
      Ok(()) => true,
      Err(e) => {
        error!(error = %e, escalation = %message.message, "Escalation could not be delivered.");
        false
      }
    }
  }

  async fn try_notify(&self, message: &EscalationMessage) -> Result<(), AppError> {
    let uri = self
      .webhook_uri
      .as_deref()
      .ok_or_else(|| AppError::EscalationNotify("LOGIC_APP_URI is not configured".to_string()))?;
    let body = serde_json::to_vec(message)?;

    let reply = self
      .http
      .post_json(OutboundRequest::new(uri, body))
      .await
      .map_err(|e| AppError::EscalationNotify(e.to_string()))?;
    info!(status = reply.status, response = %reply.body, "Workflow webhook answered.");
    if reply.is_success() {
      Ok(())
    } else {
      Err(AppError::EscalationNotify(format!("webhook replied {}", reply.status)))
    }
  }
}
