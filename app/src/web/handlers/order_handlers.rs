// order-relay/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use relay_flow::{ContextData, PipelineResult};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::order::Order;
use crate::pipelines::contexts::PublishCtxData;
use crate::state::AppState;

/// Publishes a newly created order. A publish failure fails the request; the
/// delivery-processor trigger runs in the background and never does.
#[instrument(name = "handler::publish_order", skip(app_state, order), fields(order_id = order.id))]
pub async fn publish_order_handler(
  app_state: web::Data<AppState>,
  order: web::Json<Order>,
) -> Result<HttpResponse, AppError> {
  let order = order.into_inner();
  let order_id = order.id;
  let ctx_data = ContextData::new(PublishCtxData::new(app_state.get_ref().clone(), order));

  match app_state.flow.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (bus_status, trigger_dispatched) = {
        let guard = ctx_data.read();
        (guard.bus_status, guard.downstream.is_some())
      };
      info!(?bus_status, trigger_dispatched, "Order published.");
      Ok(HttpResponse::Accepted().json(json!({
        "orderId": order_id,
        "published": true,
        "deliveryTriggerDispatched": trigger_dispatched,
      })))
    }
    PipelineResult::Stopped => {
      warn!("Publish pipeline stopped before the order reached the bus.");
      Err(AppError::Publish("order was not published".to_string()))
    }
  }
}
