use std::sync::Arc;

use sieve_core::{
    CleaningPipeline, Config, CsvReader, ProgressHub, TaskOrchestrator,
};

/// Orchestrator type served by the API.
pub type Orchestrator = TaskOrchestrator<CsvReader>;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Build the hub, pipeline and orchestrator described by `config`.
    pub fn from_config(config: Config) -> Self {
        let hub = Arc::new(ProgressHub::new(config.hub.clone()));
        let pipeline = CleaningPipeline::new(config.pipeline.clone(), CsvReader::new());
        let orchestrator = Arc::new(TaskOrchestrator::new(
            config.orchestrator.clone(),
            pipeline,
            hub,
        ));
        Self::new(config, orchestrator)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn hub(&self) -> &Arc<ProgressHub> {
        self.orchestrator.hub()
    }
}
