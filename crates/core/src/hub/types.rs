//! Types for the progress hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A status update for one task, as sent to the live observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    pub message: String,
    /// Percentage in `0..=100`, non-decreasing within a task.
    pub progress: u8,
    /// Set on the last event of a task.
    #[serde(default)]
    pub finished: bool,
}

impl ProgressEvent {
    pub fn new(level: Severity, message: impl Into<String>, progress: u8) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            progress: progress.min(100),
            finished: false,
        }
    }

    pub fn info(message: impl Into<String>, progress: u8) -> Self {
        Self::new(Severity::Info, message, progress)
    }

    pub fn success(message: impl Into<String>, progress: u8) -> Self {
        Self::new(Severity::Success, message, progress)
    }

    pub fn error(message: impl Into<String>, progress: u8) -> Self {
        Self::new(Severity::Error, message, progress)
    }

    /// Mark this as the task's final event.
    pub fn terminal(mut self) -> Self {
        self.finished = true;
        self
    }

    /// JSON text frame for the wire.
    pub fn to_json(&self) -> String {
        // Serializing plain fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Identifies one subscribe call, so a superseded connection can release
/// its binding without detaching the connection that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
