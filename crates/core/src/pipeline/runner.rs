//! Cleaning pipeline runner.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::cancel::CancellationToken;
use super::config::PipelineConfig;
use super::stages;
use crate::hub::{ProgressEvent, ProgressHub};
use crate::table::{Table, TableError, TableReader, TabularData};

/// Errors that end a pipeline run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input is not a usable table.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Table(#[from] TableError),

    /// Cancellation was observed at a checkpoint.
    #[error("Processing cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Product of a successful run.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: Table,
    pub original_rows: usize,
    pub original_columns: usize,
    pub target_columns: Vec<String>,
    pub summary: String,
}

/// Publishes one task's progress through the hub.
///
/// Non-terminal events are dropped once the task's token is cancelled. The
/// check runs under the hub's per-task lock, so nothing slips through after
/// a cancel has passed [`ProgressHub::barrier`].
pub struct ProgressReporter {
    task_id: String,
    hub: Arc<ProgressHub>,
    token: CancellationToken,
    last_progress: AtomicU8,
}

impl ProgressReporter {
    pub fn new(task_id: impl Into<String>, hub: Arc<ProgressHub>, token: CancellationToken) -> Self {
        Self {
            task_id: task_id.into(),
            hub,
            token,
            last_progress: AtomicU8::new(0),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Highest progress value published so far.
    pub fn last_progress(&self) -> u8 {
        self.last_progress.load(Ordering::SeqCst)
    }

    /// Publish a non-terminal event. Returns false if the task was cancelled.
    pub async fn report(&self, event: ProgressEvent) -> bool {
        let progress = event.progress;
        let token = &self.token;
        let accepted = self
            .hub
            .publish_if(&self.task_id, event, || !token.is_cancelled())
            .await;
        if accepted {
            self.last_progress.fetch_max(progress, Ordering::SeqCst);
        }
        accepted
    }

    pub async fn info(&self, message: impl Into<String>, progress: u8) -> bool {
        self.report(ProgressEvent::info(message, progress)).await
    }

    /// Publish the task's final event, regardless of cancellation.
    pub async fn finish(&self, event: ProgressEvent) {
        let event = event.terminal();
        self.last_progress.fetch_max(event.progress, Ordering::SeqCst);
        self.hub.publish(&self.task_id, event).await;
    }
}

/// Runs the cleaning stages over an uploaded payload.
pub struct CleaningPipeline<R: TableReader> {
    config: PipelineConfig,
    reader: Arc<R>,
}

impl<R: TableReader + 'static> CleaningPipeline<R> {
    pub fn new(config: PipelineConfig, reader: R) -> Self {
        Self {
            config,
            reader: Arc::new(reader),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `payload`, reporting progress as it goes.
    ///
    /// The final 100% event is left to the caller, which publishes it once
    /// the outcome has been recorded.
    pub async fn run(
        &self,
        payload: Vec<u8>,
        reporter: &ProgressReporter,
        token: &CancellationToken,
    ) -> Result<CleaningOutcome, PipelineError> {
        let task_id = reporter.task_id().to_string();

        self.checkpoint(token).await?;
        reporter.info("Starting CSV processing...", 5).await;

        self.checkpoint(token).await?;
        reporter
            .info(format!("Reading {} file...", self.reader.format_name().to_uppercase()), 10)
            .await;
        let mut table = self.parse(payload).await?;
        let (original_rows, original_columns) = table.shape();
        if original_rows == 0 {
            return Err(PipelineError::Validation("CSV file is empty".to_string()));
        }
        if original_columns == 0 {
            return Err(PipelineError::Validation("CSV has no columns".to_string()));
        }
        reporter
            .info(
                format!("Loaded {} rows, {} columns", original_rows, original_columns),
                20,
            )
            .await;

        self.checkpoint(token).await?;
        reporter.info("Analyzing data structure...", 30).await;

        self.checkpoint(token).await?;
        reporter.info("Removing empty columns...", 40).await;
        let removed = stages::drop_empty_columns(&mut table)?;
        if table.column_names().is_empty() {
            return Err(PipelineError::Validation(
                "CSV has no non-empty columns".to_string(),
            ));
        }
        if !removed.is_empty() {
            reporter
                .info(format!("Removed {} empty columns", removed.len()), 45)
                .await;
        }

        self.checkpoint(token).await?;
        reporter.info("Removing duplicate rows...", 50).await;
        let duplicates = stages::drop_duplicate_rows(&mut table);
        if duplicates > 0 {
            reporter
                .info(format!("Removed {} duplicate rows", duplicates), 60)
                .await;
        }

        self.checkpoint(token).await?;
        reporter.info("Handling missing values...", 70).await;
        let filled = stages::fill_missing_values(&mut table)?;
        // Filling can make rows identical that differed only in missing cells.
        let collapsed = stages::drop_duplicate_rows(&mut table);
        let message = if collapsed > 0 {
            format!(
                "Filled missing values in {} columns, removed {} rows made identical",
                filled.len(),
                collapsed
            )
        } else {
            format!("Filled missing values in {} columns", filled.len())
        };
        reporter.info(message, 75).await;

        self.checkpoint(token).await?;
        reporter.info("Identifying target columns...", 80).await;
        let target_columns = stages::target_candidates(&table);
        reporter
            .info(
                format!("Found {} potential target columns", target_columns.len()),
                85,
            )
            .await;

        self.checkpoint(token).await?;
        let (rows, columns) = table.shape();
        let summary = format!(
            "Processed [{}x{}] > {} rows, {} columns",
            original_rows, original_columns, rows, columns
        );
        reporter
            .report(ProgressEvent::success("Processing completed successfully!", 90))
            .await;
        reporter
            .info(
                serde_json::to_string(&target_columns).unwrap_or_else(|_| "[]".to_string()),
                95,
            )
            .await;

        info!("Task {} cleaned: {}", task_id, summary);
        Ok(CleaningOutcome {
            table,
            original_rows,
            original_columns,
            target_columns,
            summary,
        })
    }

    async fn parse(&self, payload: Vec<u8>) -> Result<Table, PipelineError> {
        let reader = Arc::clone(&self.reader);
        let table = tokio::task::spawn_blocking(move || reader.read(&payload))
            .await
            .map_err(|e| PipelineError::Internal(format!("parser task failed: {}", e)))??;
        Ok(table)
    }

    async fn checkpoint(&self, token: &CancellationToken) -> Result<(), PipelineError> {
        if self.config.checkpoint_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.checkpoint_delay_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
        if token.is_cancelled() {
            debug!("Cancellation observed at checkpoint");
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}
