// order-relay/src/main.rs

use order_relay::config::AppConfig;
use order_relay::services::{OrderReservationConsumer, ReqwestHttp};
use order_relay::state::AppState;
use order_relay::web;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  if std::env::var("LOG_FORMAT").map_or(false, |v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  init_tracing();
  tracing::info!("Starting order relay...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let http = match ReqwestHttp::new(app_config.http_timeout) {
    Ok(client) => Arc::new(client),
    Err(e) => {
      tracing::error!(error = %e, "Failed to build the outbound HTTP client.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let store = app_config.storage.build();
  let (app_state, worker) = AppState::build(app_config.clone(), store, http);

  let consumer = Arc::new(OrderReservationConsumer::new(app_state.clone()));
  let worker_task = tokio::spawn(worker.run(consumer));

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  let server_state = app_state.clone();
  let result = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(server_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  app_state.queue.shutdown();
  if let Err(e) = worker_task.await {
    tracing::error!(error = %e, "Order queue worker ended abnormally.");
  }
  tracing::info!("Order relay stopped.");
  result
}
