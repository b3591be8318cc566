// order-relay/src/pipelines/publish_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::PublishCtxData;
use crate::state::AppState;
use relay_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

pub fn register_publish_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<PublishCtxData, AppError>::new(&[
    ("serialize_order", false, None),
    ("publish_to_bus", false, None),
    ("trigger_delivery_processor", false, None),
  ]);
  // The event is already on the bus by now; a failed trigger must not undo it.
  p.mark_best_effort("trigger_delivery_processor");

  p.on_root("serialize_order", |ctx_data: ContextData<PublishCtxData>| async move {
    let payload = ctx_data.read().order.to_json_bytes()?;
    info!(order_id = ctx_data.read().order.id, bytes = payload.len(), "Order serialized.");
    ctx_data.write().payload = Some(payload);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("publish_to_bus", |ctx_data: ContextData<PublishCtxData>| async move {
    let (publisher, payload) = {
      let guard = ctx_data.read();
      (guard.app_state.publisher.clone(), guard.payload.clone())
    };
    let payload = payload.ok_or_else(|| AppError::Internal("order was not serialized before publish".to_string()))?;

    let reply = publisher.publish(&payload).await?;
    ctx_data.write().bus_status = Some(reply.status);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root(
    "trigger_delivery_processor",
    |ctx_data: ContextData<PublishCtxData>| async move {
      let (publisher, payload, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.publisher.clone(), guard.payload.clone(), guard.order.id)
      };
      let payload = payload.ok_or_else(|| AppError::Internal("order was not serialized before trigger".to_string()))?;

      let span = tracing::info_span!("delivery_trigger", order_id);
      let task = tokio::spawn(
        async move {
          let result = publisher.trigger_downstream(&payload).await;
          if let Err(e) = &result {
            warn!(error = %e, "Delivery processor trigger failed; the published event stands.");
          }
          result
        }
        .instrument(span),
      );
      ctx_data.write().downstream = Some(task);
      Ok::<_, AppError>(PipelineControl::Continue)
    },
  );

  registry.register_pipeline(p);
  info!("Order publish pipeline registered.");
}
