// order-relay/src/services/reservation.rs

//! Consumer side of the order bus: persists each order message and decides, per
//! delivery, between acknowledging, asking for a redelivery and escalating.

use crate::errors::{AppError, Result};
use crate::models::escalation::EscalationMessage;
use crate::models::order::Order;
use crate::pipelines::contexts::ReservationCtxData;
use crate::queue::{InboundMessage, MessageHandler, ReservationOutcome};
use crate::state::AppState;
use async_trait::async_trait;
use relay_flow::{ContextData, PipelineResult};
use tracing::{error, info, instrument, warn};

pub struct OrderReservationConsumer {
  app_state: AppState,
}

impl OrderReservationConsumer {
  pub fn new(app_state: AppState) -> Self {
    Self { app_state }
  }

  async fn escalate(&self, ctx_data: &ContextData<ReservationCtxData>, failure: &AppError) -> ReservationOutcome {
    let (order, body) = {
      let guard = ctx_data.read();
      (guard.order.clone(), guard.message.body.clone())
    };
    let order = match order {
      Some(order) => order,
      None => match Order::from_json_slice(body.as_bytes()) {
        Ok(order) => order,
        Err(e) => {
          return ReservationOutcome::DeadLettered {
            reason: format!("{}; payload unreadable for escalation: {}", failure, e),
          }
        }
      },
    };

    let message = EscalationMessage::persistence_failed(order, &failure.to_string());
    let delivered = self.app_state.notifier.notify(&message).await;
    warn!(delivered, "Retries exhausted; order escalated and message acknowledged.");
    ReservationOutcome::Escalated
  }
}

#[async_trait]
impl MessageHandler for OrderReservationConsumer {
  #[instrument(
    name = "reservation::handle",
    skip_all,
    fields(message_id = %message.message_id, delivery_count = message.delivery_count)
  )]
  async fn handle(&self, message: &InboundMessage) -> Result<ReservationOutcome> {
    let retry = &self.app_state.config.queue.retry;
    let ctx_data = ContextData::new(ReservationCtxData::new(self.app_state.clone(), message.clone()));

    let failure = match self.app_state.flow.run(ctx_data.clone()).await {
      Ok(PipelineResult::Completed) => {
        let object_key = ctx_data.read().object_key.clone();
        return match object_key {
          Some(object_key) => Ok(ReservationOutcome::Stored { object_key }),
          None => Err(AppError::Internal("reservation completed without an object key".to_string())),
        };
      }
      Ok(PipelineResult::Stopped) => AppError::Internal("reservation pipeline stopped early".to_string()),
      Err(e) => e,
    };

    if failure.is_malformed_payload() {
      error!(error = %failure, "Order payload is unreadable; not retrying.");
      return Ok(ReservationOutcome::DeadLettered {
        reason: failure.to_string(),
      });
    }

    if failure.is_retryable() && !retry.is_exhausted(message.delivery_count) {
      info!(
        error = %failure,
        attempt = message.delivery_count,
        max_attempts = retry.max_attempts,
        "Persistence failed; handing the message back for redelivery."
      );
      return Err(failure);
    }

    Ok(self.escalate(&ctx_data, &failure).await)
  }
}
