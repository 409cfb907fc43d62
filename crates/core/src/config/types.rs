use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::orchestrator::Strategy;

/// Root configuration
///
/// Every section has defaults, so an empty document is a valid config.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Upstream endpoints consumed by the two fetch stages
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointsConfig {
    /// First-stage endpoint, answers `{"item_id": <integer>}`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Second-stage endpoint prefix, queried as `<item_url>/<item_id>`
    #[serde(default = "default_item_url")]
    pub item_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            item_url: default_item_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000/".to_string()
}

fn default_item_url() -> String {
    "http://127.0.0.1:5000/items".to_string()
}

/// HTTP session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Connect and read timeout in seconds (default: 2).
    /// There is no total per-request deadline.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    2
}

/// Batch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Number of first-stage fetches launched per run (default: 500)
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Orchestration strategy (default: as_completed)
    #[serde(default)]
    pub strategy: Strategy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            strategy: Strategy::default(),
        }
    }
}

fn default_batch_size() -> usize {
    500
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Write the Prometheus text exposition to stderr after the run
    #[serde(default)]
    pub dump_on_exit: bool,
}
