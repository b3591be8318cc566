// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use relay_flow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct RelayTestCtx {
  pub attempts: u32,
  pub trail: String,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  // FlowError is neither Clone nor PartialEq, so keep its Debug text.
  #[error("flow error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

pub fn recording_handler(step_name: &'static str, mark: &'static str) -> relay_flow::Handler<RelayTestCtx, TestError> {
  Box::new(move |ctx: ContextData<RelayTestCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.attempts += 1;
      guard.trail.push_str(mark);
      guard.steps_executed.push(step_name.to_string());
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, reason: &'static str) -> relay_flow::Handler<RelayTestCtx, TestError> {
  Box::new(move |ctx: ContextData<RelayTestCtx>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_handlers", step = step_name, "failing with '{}'", reason);
      Err(TestError::Handler(reason.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
