//! Event system for presentation layers.
//!
//! Orchestrator state transitions are published as ordered events instead of
//! side-effecting any UI directly. Subscribers (a sidebar, a logger, a test)
//! all observe the same sequence the orchestrator emitted.

mod event_bus;
pub mod event_types;

pub use event_bus::{BusEvent, EventBus};
