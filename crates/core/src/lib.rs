pub mod config;
pub mod fetch;
pub mod metrics;
pub mod orchestrator;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, BatchConfig,
    ClientConfig, Config, ConfigError, EndpointsConfig, MetricsConfig,
};
pub use fetch::{FetchError, HttpSession, ItemSource, Stage};
pub use orchestrator::{
    run_as_completed, run_batch, run_gather, run_with_session, BatchTally, ItemRecord, LineSink,
    MemberFailure, OrchestratorError, ResultSink, RunReport, StdoutSink, Strategy,
};
