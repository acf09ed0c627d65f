//! Cleaning pipeline for uploaded tables.
//!
//! Stages run in a fixed order. Between stages the pipeline passes a
//! checkpoint where cancellation is observed, so a stage that has started
//! always runs to completion.
//!
//! 1. Parse the payload and reject empty or columnless input
//! 2. Drop columns with no values
//! 3. Drop duplicate rows
//! 4. Fill missing values (median for numbers, `"Unknown"` otherwise)
//! 5. Pick target column candidates
//! 6. Assemble the outcome

mod cancel;
mod config;
mod runner;
mod stages;

pub use cancel::CancellationToken;
pub use config::PipelineConfig;
pub use runner::{CleaningOutcome, CleaningPipeline, PipelineError, ProgressReporter};
pub use stages::{
    drop_duplicate_rows, drop_empty_columns, fill_missing_values, target_candidates,
    FILL_SENTINEL, TARGET_MAX_DISTINCT,
};
