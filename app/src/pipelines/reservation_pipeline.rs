// order-relay/src/pipelines/reservation_pipeline.rs

use crate::errors::AppError;
use crate::models::order::Order;
use crate::pipelines::contexts::ReservationCtxData;
use crate::state::AppState;
use relay_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Orders holding this catalog item fail persistence on purpose while `TEST_FAILURE` is on.
pub const FAILURE_SENTINEL_CATALOG_ITEM_ID: i32 = 3;

pub const ORDER_CONTENT_TYPE: &str = "application/json";

pub fn register_reservation_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let injection_disabled: SkipCondition<ReservationCtxData> =
    Arc::new(|ctx_data: ContextData<ReservationCtxData>| !ctx_data.read().app_state.config.test_failure);

  let mut p = Pipeline::<ReservationCtxData, AppError>::new(&[
    ("decode_order", false, None),
    ("inject_test_failure", false, Some(injection_disabled)),
    ("ensure_container", false, None),
    ("upload_order", false, None),
    ("confirm_upload", false, None),
  ]);

  p.on_root("decode_order", |ctx_data: ContextData<ReservationCtxData>| async move {
    let order = {
      let guard = ctx_data.read();
      Order::from_json_slice(guard.message.body.as_bytes()).map_err(|e| AppError::MalformedPayload(e.to_string()))?
    };
    debug!(order_id = order.id, items = order.order_items.len(), "Order payload decoded.");
    ctx_data.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("inject_test_failure", |ctx_data: ContextData<ReservationCtxData>| async move {
    let guard = ctx_data.read();
    if let Some(order) = guard.order.as_ref() {
      if order.contains_catalog_item(FAILURE_SENTINEL_CATALOG_ITEM_ID) {
        warn!(order_id = order.id, "Injecting persistence failure for sentinel catalog item.");
        return Err(AppError::InjectedTestFailure(format!(
          "order {} holds catalog item {}",
          order.id, FAILURE_SENTINEL_CATALOG_ITEM_ID
        )));
      }
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("ensure_container", |ctx_data: ContextData<ReservationCtxData>| async move {
    let (store, container) = {
      let guard = ctx_data.read();
      (guard.app_state.store.clone(), guard.app_state.config.orders_container.clone())
    };
    let created = store.ensure_container(&container).await?;
    if created {
      info!(%container, "Orders container created.");
    }
    ctx_data.write().container_created = created;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("upload_order", |ctx_data: ContextData<ReservationCtxData>| async move {
    let (store, container, body) = {
      let guard = ctx_data.read();
      (
        guard.app_state.store.clone(),
        guard.app_state.config.orders_container.clone(),
        guard.message.body.clone(),
      )
    };
    // A fresh key per attempt, so a redelivered message never overwrites an earlier object.
    let object_key = Uuid::new_v4().to_string();
    store.put(&container, &object_key, body.as_bytes(), ORDER_CONTENT_TYPE).await?;
    debug!(%container, %object_key, "Order uploaded.");
    ctx_data.write().object_key = Some(object_key);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("confirm_upload", |ctx_data: ContextData<ReservationCtxData>| async move {
    let (store, container, object_key) = {
      let guard = ctx_data.read();
      (
        guard.app_state.store.clone(),
        guard.app_state.config.orders_container.clone(),
        guard.object_key.clone(),
      )
    };
    let object_key = object_key.ok_or_else(|| AppError::Internal("no object key recorded before confirmation".to_string()))?;

    let properties = store
      .properties(&container, &object_key)
      .await?
      .ok_or_else(|| AppError::TransientStorage(format!("object {}/{} missing after upload", container, object_key)))?;
    info!(
      %object_key,
      content_type = %properties.content_type,
      content_length = properties.content_length,
      "Order persisted."
    );
    ctx_data.write().stored = Some(properties);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(p);
  info!("Order reservation pipeline registered.");
}
