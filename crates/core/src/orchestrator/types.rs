//! Orchestrator types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to callers of the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The id belongs to a task that has not finished.
    #[error("task {0} is already active")]
    AlreadyActive(String),

    /// The id is unknown or no longer active.
    #[error("task {0} not found")]
    NotFound(String),

    /// The payload was rejected before a task was created.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The concurrent task limit is reached.
    #[error("too many active tasks (limit {0})")]
    AtCapacity(usize),
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of a task. Created once, when the task terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub state: TaskState,
    pub success: bool,
    pub original_rows: usize,
    pub cleaned_rows: usize,
    pub columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub summary: String,
    pub finished_at: DateTime<Utc>,
}

impl TaskResult {
    /// A result with no table data, for failed or cancelled tasks.
    pub(crate) fn unsuccessful(
        task_id: impl Into<String>,
        state: TaskState,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            state,
            success: false,
            original_rows: 0,
            cleaned_rows: 0,
            columns: Vec::new(),
            target_columns: Vec::new(),
            summary: summary.into(),
            finished_at: Utc::now(),
        }
    }
}

/// Snapshot of orchestrator state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub queued: usize,
    pub running: usize,
    /// Cancelled tasks whose execution has not reached a checkpoint yet.
    pub cancelling: usize,
    pub stored_results: usize,
    pub reaper_running: bool,
}
