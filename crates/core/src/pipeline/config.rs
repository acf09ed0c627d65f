//! Configuration for the cleaning pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for the cleaning pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause at every checkpoint (milliseconds).
    /// Gives a browser time to attach before the task races to completion.
    #[serde(default)]
    pub checkpoint_delay_ms: u64,
}
