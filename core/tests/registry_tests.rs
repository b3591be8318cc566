// tests/registry_tests.rs
mod common;

use common::*;
use relay_flow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default)]
struct PublishCtx {
  sent: bool,
}

#[derive(Clone, Debug, Default)]
struct ReserveCtx {
  stored_objects: u32,
}

fn publish_pipeline() -> Pipeline<PublishCtx, TestError> {
  let mut p = Pipeline::<PublishCtx, TestError>::new(&[("send", false, None)]);
  p.on_root("send", |ctx: ContextData<PublishCtx>| async move {
    ctx.write().sent = true;
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  p
}

#[tokio::test]
async fn test_registry_dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  registry.register_pipeline(publish_pipeline());

  let mut reserve = Pipeline::<ReserveCtx, TestError>::new(&[("store", false, None)]);
  reserve.on_root("store", |ctx: ContextData<ReserveCtx>| async move {
    ctx.write().stored_objects += 1;
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  registry.register_pipeline(reserve);

  assert!(registry.is_registered::<PublishCtx>());
  assert!(registry.is_registered::<ReserveCtx>());

  let publish_ctx = ContextData::new(PublishCtx::default());
  assert_eq!(registry.run(publish_ctx.clone()).await, Ok(PipelineResult::Completed));
  assert!(publish_ctx.read().sent);

  let reserve_ctx = ContextData::new(ReserveCtx::default());
  assert_eq!(registry.run(reserve_ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(reserve_ctx.read().stored_objects, 1);
}

#[tokio::test]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let result = registry.run(ContextData::new(ReserveCtx::default())).await;
  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("ConfigurationError"));
      assert!(s.contains("ReserveCtx"));
    }
    other => panic!("expected a configuration error, got {:?}", other),
  }
}

#[tokio::test]
async fn test_registry_maps_handler_errors() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let mut p = Pipeline::<ReserveCtx, TestError>::new(&[("store", false, None)]);
  p.on_root("store", |_ctx: ContextData<ReserveCtx>| async move {
    Err::<PipelineControl, _>(TestError::Handler("write rejected".to_string()))
  });
  registry.register_pipeline(p);

  let result = registry.run(ContextData::new(ReserveCtx::default())).await;
  assert_eq!(result, Err(TestError::Handler("write rejected".to_string())));
}

#[tokio::test]
async fn test_default_registry_uses_flow_error() {
  setup_tracing();
  let registry: FlowRegistry = FlowRegistry::default();
  let result = registry.run(ContextData::new(PublishCtx::default())).await;
  assert!(matches!(result, Err(FlowError::ConfigurationError { .. })));
}
