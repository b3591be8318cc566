// relay-flow/src/core/control.rs

//! Flow signals returned by handlers and the overall outcome of a run.

/// Returned by a handler to say whether the run goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt the run. Remaining handlers of this step and all later steps are skipped.
  Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step that was not skipped ran to the end.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
