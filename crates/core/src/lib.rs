pub mod config;
pub mod hub;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod table;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ServerConfig, UploadConfig,
};
pub use hub::{
    ChannelTransport, HubConfig, ProgressEvent, ProgressHub, Severity, SubscriptionId, Transport,
    TransportError,
};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorStatus, TaskOrchestrator, TaskResult,
    TaskState,
};
pub use pipeline::{
    CancellationToken, CleaningOutcome, CleaningPipeline, PipelineConfig, PipelineError,
    ProgressReporter,
};
pub use table::{Column, ColumnKind, CsvReader, Table, TableError, TableReader, TabularData, Value};
