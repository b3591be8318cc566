// order-relay/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{order_handlers, queue_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/orders", web::post().to(order_handlers::publish_order_handler))
      .service(
        web::scope("/queue")
          .route("/orders", web::post().to(queue_handlers::enqueue_order_message_handler))
          .route("/stats", web::get().to(queue_handlers::queue_stats_handler))
          .route("/dead-letters", web::get().to(queue_handlers::dead_letters_handler)),
      ),
  );
}
