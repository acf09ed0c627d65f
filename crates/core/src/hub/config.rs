//! Hub configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the progress hub and its live transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Replay queue length that triggers a trim.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of most recent events kept when the queue is trimmed.
    #[serde(default = "default_overflow_retain")]
    pub overflow_retain: usize,

    /// How often a live connection is pinged (seconds).
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Buffer between the hub and a connection's writer task.
    #[serde(default = "default_transport_buffer")]
    pub transport_buffer: usize,
}

fn default_queue_capacity() -> usize {
    100
}

fn default_overflow_retain() -> usize {
    50
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_transport_buffer() -> usize {
    128
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            overflow_retain: default_overflow_retain(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            transport_buffer: default_transport_buffer(),
        }
    }
}
