// order-relay/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::queue::{OrderQueue, QueueWorker};
use crate::services::bus_publisher::EventPublisher;
use crate::services::escalation::EscalationNotifier;
use crate::services::http_client::OutboundHttp;
use crate::storage::BlobStore;
use relay_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub flow: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub store: Arc<dyn BlobStore>,
  pub publisher: EventPublisher,
  pub notifier: EscalationNotifier,
  pub queue: OrderQueue,
}

impl AppState {
  /// Wires the services, registers the pipelines and creates the order queue. The
  /// returned worker still has to be run with a consumer.
  pub fn build(config: Arc<AppConfig>, store: Arc<dyn BlobStore>, http: Arc<dyn OutboundHttp>) -> (AppState, QueueWorker) {
    let flow = Arc::new(FlowRegistry::<AppError>::new());
    let (queue, worker) = OrderQueue::channel(config.queue.clone());
    let app_state = AppState {
      flow: flow.clone(),
      publisher: EventPublisher::new(http.clone(), config.clone()),
      notifier: EscalationNotifier::new(http, config.workflow_webhook_uri.clone()),
      config,
      store,
      queue,
    };
    pipelines::register_all_pipelines(&flow, &app_state);
    (app_state, worker)
  }
}
