//! Task orchestrator for cleaning uploads in the background.
//!
//! The orchestrator owns task identity and lifecycle:
//! - **Start**: atomic check-and-set on the task id, then a spawned run
//! - **Cancel**: cooperative, observed at the next pipeline checkpoint
//! - **Results**: stored once per terminal task, optionally reaped after a TTL

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::TaskOrchestrator;
pub use types::{OrchestratorError, OrchestratorStatus, TaskResult, TaskState};
