// relay-flow/src/pipeline/definition.rs

//! `Pipeline<TData, Err>`: construction and step configuration.

use crate::core::handler::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered set of named steps over a root context `TData`.
///
/// `Err` is the error type handlers return. It must be constructible from
/// [`FlowError`] so engine-level failures (such as a required step without
/// handlers) surface through the same type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` triples, in run order.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_cond_opt)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        best_effort: false,
        skip_if: skip_cond_opt.clone(),
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Panics when `step_name` is not part of the pipeline. A missing step here is a
  /// wiring mistake made while building the pipeline, not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("relay-flow setup error: step '{}' is not defined in this pipeline.", step_name);
    }
  }

  fn step_mut(&mut self, step_name: &str) -> &mut StepDef<TData> {
    self.ensure_step_exists(step_name);
    match self.steps.iter_mut().find(|s| s.name == step_name) {
      Some(step) => step,
      None => unreachable!("step existence checked above"),
    }
  }

  /// Failures of this step's handlers are logged and swallowed.
  pub fn mark_best_effort(&mut self, step_name: &str) {
    self.step_mut(step_name).best_effort = true;
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }
}
