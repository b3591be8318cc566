// relay-flow/src/lib.rs

//! relay-flow: the step pipeline engine behind the order relay.
//!
//! A pipeline is an ordered list of named steps. Each step may carry `before`, `on`
//! and `after` handlers which run against a shared [`ContextData`]. A handler either
//! lets the run continue or stops it; an error aborts the run unless the step was
//! declared best-effort, in which case the error is logged and the run moves on.
//!
//! Pipelines are registered in a [`FlowRegistry`] keyed by their context type, so a
//! caller only needs to build the context and hand it over.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
