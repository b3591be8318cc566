// relay-flow/src/core/handler.rs

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler.
///
/// Handlers receive a clone of the run's `ContextData<TData>` and resolve to a
/// `PipelineControl` or the pipeline's error type. Lock guards taken on the context
/// must be released before the handler awaits anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
