// relay-flow/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order and executes their handlers.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler asks for it. A handler error ends the run
  /// with that error, except inside a best-effort step where it is logged and the run
  /// moves to the next step.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        best_effort = step_def.best_effort
      );

      let control = self.run_step(step_def, ctx_data.clone()).instrument(step_span).await?;
      if control == PipelineControl::Stop {
        event!(Level::INFO, step_name = %step_def.name, "Pipeline stopped by a handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline run completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: ContextData<TData>) -> Result<PipelineControl, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_cond_fn) = &step_def.skip_if {
      if skip_cond_fn(ctx_data.clone()) {
        event!(Level::INFO, "Step skipped by its skip condition.");
        return Ok(PipelineControl::Continue);
      }
    }

    let phases = [
      ("before", self.before.get(step_name)),
      ("on", self.on.get(step_name)),
      ("after", self.after.get(step_name)),
    ];

    if phases.iter().all(|(_, handlers)| handlers.map_or(true, |v| v.is_empty())) {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(PipelineControl::Continue);
      }
      event!(Level::ERROR, "Required step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, handlers) in phases {
      let Some(handlers) = handlers else { continue };
      match run_phase(phase, handlers, &ctx_data).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
        Err(e) if step_def.best_effort => {
          event!(Level::WARN, error = %e, phase, "Best-effort step failed; continuing.");
          return Ok(PipelineControl::Continue);
        }
        Err(e) => {
          event!(Level::ERROR, error = %e, phase, "Step handler failed.");
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Step finished.");
    Ok(PipelineControl::Continue)
  }
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: 'static + Send + Sync,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let handler_span = span!(Level::DEBUG, "step_handler", phase, handler_index = handler_idx);
    if handler_fn(ctx_data.clone()).instrument(handler_span).await? == PipelineControl::Stop {
      return Ok(PipelineControl::Stop);
    }
  }
  Ok(PipelineControl::Continue)
}
