// order-relay/src/lib.rs

//! Order relay: publishes new orders to the bus and persists the orders the bus hands
//! back, with bounded retry and escalation.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod queue;
pub mod services;
pub mod state;
pub mod storage;
pub mod web;
