//! Task orchestrator implementation.
//!
//! Every task runs as its own tokio task. A single registry lock guards the
//! active set and the result store; the hub serializes events per task.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::hub::{ProgressEvent, ProgressHub};
use crate::metrics::{RESULTS_REAPED, TASKS_FINISHED, TASKS_REJECTED, TASKS_STARTED, TASK_DURATION};
use crate::pipeline::{
    CancellationToken, CleaningOutcome, CleaningPipeline, PipelineError, ProgressReporter,
};
use crate::table::{Table, TableReader, TabularData};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, OrchestratorStatus, TaskResult, TaskState};

/// Bookkeeping for a task that has not been forgotten by the active set.
struct TaskSlot {
    /// Distinguishes runs that reuse the same id.
    generation: u64,
    state: TaskState,
    token: CancellationToken,
    cancel_requested: bool,
}

impl TaskSlot {
    fn is_active(&self) -> bool {
        !self.state.is_terminal() && !self.cancel_requested
    }
}

struct StoredResult {
    result: Arc<TaskResult>,
    table: Option<Arc<Table>>,
}

#[derive(Default)]
struct Registry {
    tasks: HashMap<String, TaskSlot>,
    results: HashMap<String, StoredResult>,
    next_generation: u64,
}

/// The task orchestrator - starts, cancels and records cleaning tasks.
pub struct TaskOrchestrator<R>
where
    R: TableReader + 'static,
{
    config: OrchestratorConfig,
    hub: Arc<ProgressHub>,
    pipeline: Arc<CleaningPipeline<R>>,
    registry: Arc<RwLock<Registry>>,

    // Reaper state
    reaper_running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<R> TaskOrchestrator<R>
where
    R: TableReader + 'static,
{
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        pipeline: CleaningPipeline<R>,
        hub: Arc<ProgressHub>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            hub,
            pipeline: Arc::new(pipeline),
            registry: Arc::new(RwLock::new(Registry::default())),
            reaper_running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<ProgressHub> {
        &self.hub
    }

    /// Register `task_id` and run the pipeline over `payload` in the background.
    ///
    /// Returns as soon as the task is spawned. Registration is a single
    /// check-and-set, so two concurrent starts for one id cannot both win.
    pub async fn start(&self, task_id: &str, payload: Vec<u8>) -> Result<(), OrchestratorError> {
        if payload.is_empty() {
            TASKS_REJECTED.with_label_values(&["validation"]).inc();
            return Err(OrchestratorError::Validation("payload is empty".to_string()));
        }

        let (generation, token) = {
            let mut registry = self.registry.write().await;

            if registry.tasks.contains_key(task_id) {
                TASKS_REJECTED.with_label_values(&["already_active"]).inc();
                return Err(OrchestratorError::AlreadyActive(task_id.to_string()));
            }
            let limit = self.config.max_concurrent_tasks;
            if limit > 0 && registry.tasks.len() >= limit {
                TASKS_REJECTED.with_label_values(&["at_capacity"]).inc();
                return Err(OrchestratorError::AtCapacity(limit));
            }

            if registry.results.remove(task_id).is_some() {
                debug!("Replacing stored result for reused task id {}", task_id);
            }

            registry.next_generation += 1;
            let generation = registry.next_generation;
            let token = CancellationToken::new();
            registry.tasks.insert(
                task_id.to_string(),
                TaskSlot {
                    generation,
                    state: TaskState::Queued,
                    token: token.clone(),
                    cancel_requested: false,
                },
            );
            (generation, token)
        };

        TASKS_STARTED.inc();
        info!("Started task {} ({} bytes)", task_id, payload.len());

        let registry = Arc::clone(&self.registry);
        let hub = Arc::clone(&self.hub);
        let pipeline = Arc::clone(&self.pipeline);
        let task_id = task_id.to_string();

        tokio::spawn(async move {
            Self::execute(registry, hub, pipeline, task_id, generation, payload, token).await;
        });

        Ok(())
    }

    /// Request cancellation of an active task.
    ///
    /// The id leaves the active set immediately. When this returns, no
    /// further non-terminal events will be published for the task.
    pub async fn cancel(&self, task_id: &str) -> Result<(), OrchestratorError> {
        {
            let mut registry = self.registry.write().await;
            let slot = registry
                .tasks
                .get_mut(task_id)
                .filter(|slot| slot.is_active())
                .ok_or_else(|| OrchestratorError::NotFound(task_id.to_string()))?;
            slot.cancel_requested = true;
            slot.token.cancel();
        }

        // A publish that checked the token before it was set may still hold
        // the task's hub lock.
        self.hub.barrier(task_id).await;

        info!("Cancellation requested for task {}", task_id);
        Ok(())
    }

    /// Result of a finished task, if any.
    pub async fn result(&self, task_id: &str) -> Option<Arc<TaskResult>> {
        self.registry
            .read()
            .await
            .results
            .get(task_id)
            .map(|stored| Arc::clone(&stored.result))
    }

    /// Cleaned table of a task that finished successfully.
    pub async fn processed_table(&self, task_id: &str) -> Option<Arc<Table>> {
        self.registry
            .read()
            .await
            .results
            .get(task_id)
            .and_then(|stored| stored.table.clone())
    }

    /// Ids of tasks that are queued or running and not cancelled.
    pub async fn active_ids(&self) -> Vec<String> {
        let registry = self.registry.read().await;
        let mut ids: Vec<String> = registry
            .tasks
            .iter()
            .filter(|(_, slot)| slot.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub async fn is_active(&self, task_id: &str) -> bool {
        self.registry
            .read()
            .await
            .tasks
            .get(task_id)
            .is_some_and(TaskSlot::is_active)
    }

    /// Whether `task_id` is still held by the orchestrator or has a stored result.
    pub async fn is_known(&self, task_id: &str) -> bool {
        let registry = self.registry.read().await;
        registry.tasks.contains_key(task_id) || registry.results.contains_key(task_id)
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        let registry = self.registry.read().await;
        let mut status = OrchestratorStatus {
            stored_results: registry.results.len(),
            reaper_running: self.reaper_running.load(Ordering::Relaxed),
            ..Default::default()
        };
        for slot in registry.tasks.values() {
            if slot.cancel_requested {
                status.cancelling += 1;
            } else {
                match slot.state {
                    TaskState::Queued => status.queued += 1,
                    TaskState::Running => status.running += 1,
                    _ => {}
                }
            }
        }
        status
    }

    /// Spawn the loop that evicts results older than `result_ttl_secs`.
    ///
    /// Does nothing when no TTL is configured.
    pub fn start_reaper(&self) {
        if self.config.result_ttl_secs == 0 {
            debug!("Result TTL disabled, reaper not started");
            return;
        }
        if self.reaper_running.swap(true, Ordering::SeqCst) {
            warn!("Reaper already running");
            return;
        }

        let running = Arc::clone(&self.reaper_running);
        let registry = Arc::clone(&self.registry);
        let hub = Arc::clone(&self.hub);
        let ttl = chrono::Duration::seconds(self.config.result_ttl_secs as i64);
        let interval = Duration::from_secs(self.config.reap_interval_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Result reaper started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Result reaper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::reap_expired(&registry, &hub, ttl).await;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
            info!("Result reaper stopped");
        });
    }

    /// Cancel every active task and stop the reaper.
    pub async fn shutdown(&self) {
        info!("Shutting down task orchestrator");

        if self.reaper_running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
        }

        for task_id in self.active_ids().await {
            if let Err(e) = self.cancel(&task_id).await {
                debug!("Task {} finished before shutdown: {}", task_id, e);
            }
        }

        info!("Task orchestrator shut down");
    }

    async fn reap_expired(
        registry: &RwLock<Registry>,
        hub: &ProgressHub,
        ttl: chrono::Duration,
    ) {
        let cutoff = Utc::now() - ttl;
        let expired: Vec<String> = {
            let mut registry = registry.write().await;
            let expired: Vec<String> = registry
                .results
                .iter()
                .filter(|(id, stored)| {
                    stored.result.finished_at < cutoff && !registry.tasks.contains_key(*id)
                })
                .map(|(id, _)| id.clone())
                .collect();
            for id in &expired {
                registry.results.remove(id);
            }
            expired
        };

        for id in &expired {
            hub.discard(id).await;
            RESULTS_REAPED.inc();
        }
        if !expired.is_empty() {
            info!("Reaped {} expired task results", expired.len());
        }
    }

    /// Body of a spawned task: run the pipeline, record the result, then
    /// publish the terminal event.
    async fn execute(
        registry: Arc<RwLock<Registry>>,
        hub: Arc<ProgressHub>,
        pipeline: Arc<CleaningPipeline<R>>,
        task_id: String,
        generation: u64,
        payload: Vec<u8>,
        token: CancellationToken,
    ) {
        let started = Instant::now();

        {
            let mut registry = registry.write().await;
            if let Some(slot) = registry.tasks.get_mut(&task_id) {
                if slot.generation == generation && slot.state == TaskState::Queued {
                    slot.state = TaskState::Running;
                }
            }
        }

        let reporter = ProgressReporter::new(task_id.clone(), Arc::clone(&hub), token.clone());
        let run = AssertUnwindSafe(pipeline.run(payload, &reporter, &token))
            .catch_unwind()
            .await;

        let outcome = match run {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Task {} panicked: {}", task_id, message);
                Err(PipelineError::Internal(message))
            }
        };

        let (result, table, event) = match outcome {
            // Cancellation wins even if the last stage completed after it.
            Ok(_) | Err(PipelineError::Cancelled) if token.is_cancelled() => {
                Self::cancelled(&task_id, &reporter)
            }
            Err(PipelineError::Cancelled) => Self::cancelled(&task_id, &reporter),
            Ok(outcome) => Self::succeeded(&task_id, outcome),
            Err(e) => {
                warn!("Task {} failed: {}", task_id, e);
                let summary = format!("Processing failed: {}", e);
                let event = ProgressEvent::error(summary.clone(), reporter.last_progress());
                let result = TaskResult::unsuccessful(&task_id, TaskState::Failed, summary);
                (result, None, event)
            }
        };

        let state = result.state;
        let stored = {
            let mut registry = registry.write().await;
            match registry.tasks.get_mut(&task_id) {
                Some(slot) if slot.generation == generation => {
                    slot.state = state;
                    registry.results.insert(
                        task_id.clone(),
                        StoredResult {
                            result: Arc::new(result),
                            table: table.map(Arc::new),
                        },
                    );
                    true
                }
                _ => false,
            }
        };
        if !stored {
            error!("Task {} lost its registry slot before finishing", task_id);
            return;
        }

        // The slot stays reserved until the terminal event is out, so a
        // reused id cannot interleave its events with this one.
        reporter.finish(event).await;

        {
            let mut registry = registry.write().await;
            if registry
                .tasks
                .get(&task_id)
                .is_some_and(|slot| slot.generation == generation)
            {
                registry.tasks.remove(&task_id);
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        TASKS_FINISHED.with_label_values(&[state.as_str()]).inc();
        TASK_DURATION
            .with_label_values(&[state.as_str()])
            .observe(elapsed);
        info!("Task {} finished as {} in {:.3}s", task_id, state, elapsed);
    }

    fn succeeded(
        task_id: &str,
        outcome: CleaningOutcome,
    ) -> (TaskResult, Option<Table>, ProgressEvent) {
        let result = TaskResult {
            task_id: task_id.to_string(),
            state: TaskState::Succeeded,
            success: true,
            original_rows: outcome.original_rows,
            cleaned_rows: outcome.table.row_count(),
            columns: outcome.table.column_names(),
            target_columns: outcome.target_columns,
            summary: outcome.summary.clone(),
            finished_at: Utc::now(),
        };
        let event = ProgressEvent::success(outcome.summary, 100);
        (result, Some(outcome.table), event)
    }

    fn cancelled(
        task_id: &str,
        reporter: &ProgressReporter,
    ) -> (TaskResult, Option<Table>, ProgressEvent) {
        let summary = "Processing cancelled";
        let event = ProgressEvent::error(summary, reporter.last_progress());
        let result = TaskResult::unsuccessful(task_id, TaskState::Cancelled, summary);
        (result, None, event)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
