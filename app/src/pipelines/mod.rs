// order-relay/src/pipelines/mod.rs

//! The relay's two workflows: publishing a new order, and reserving (persisting) an
//! order that arrived from the bus.

use crate::errors::AppError;
use crate::state::AppState;
use relay_flow::FlowRegistry;
use std::sync::Arc;

pub mod contexts;
pub mod publish_pipeline;
pub mod reservation_pipeline;

/// Registers every pipeline with `registry`. Called once at startup.
pub fn register_all_pipelines(registry: &Arc<FlowRegistry<AppError>>, app_state: &AppState) {
  tracing::info!("Registering relay pipelines...");
  publish_pipeline::register_publish_pipeline(registry, app_state);
  reservation_pipeline::register_reservation_pipeline(registry, app_state);
  tracing::info!("All relay pipelines registered.");
}
