// order-relay/src/web/handlers/queue_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;

/// Local stand-in for the bus trigger: the raw body becomes one inbound message.
#[instrument(name = "handler::enqueue_order_message", skip(app_state, body), fields(bytes = body.len()))]
pub async fn enqueue_order_message_handler(app_state: web::Data<AppState>, body: String) -> Result<HttpResponse, AppError> {
  let message_id = app_state.queue.enqueue(body)?;
  info!(%message_id, "Order message enqueued.");
  Ok(HttpResponse::Accepted().json(json!({ "messageId": message_id })))
}

pub async fn queue_stats_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let stats = app_state.queue.stats();
  HttpResponse::Ok().json(json!({
    "stats": stats,
    "acknowledged": stats.acknowledged(),
    "outstanding": app_state.queue.outstanding(),
  }))
}

pub async fn dead_letters_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(app_state.queue.dead_letters())
}
