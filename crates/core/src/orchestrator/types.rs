//! Types for batch orchestration.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::fetch::{FetchError, Stage};

/// Errors that can abort a whole run.
///
/// Member failures never show up here; they are reported through the sink.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The shared HTTP session could not be built.
    #[error("failed to open session: {0}")]
    Session(#[from] FetchError),
}

/// How first-stage results are consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Process each member as soon as its first stage completes.
    #[default]
    AsCompleted,
    /// Wait for the whole first stage, then chain sequentially in launch order.
    Gather,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AsCompleted => "as_completed",
            Strategy::Gather => "gather",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chained second-stage result for one batch member.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    /// Launch index of the member within its batch.
    pub index: usize,
    /// Identifier returned by the first stage.
    pub item_id: i64,
    /// Second-stage body, passed through unmodified.
    pub body: Value,
}

/// A captured failure for one batch member.
#[derive(Debug, Clone)]
pub struct MemberFailure {
    /// Launch index of the member within its batch.
    pub index: usize,
    /// Stage that failed.
    pub stage: Stage,
    /// Identifier, when the first stage had already succeeded.
    pub item_id: Option<i64>,
    pub error: FetchError,
}

impl fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_id {
            Some(item_id) => write!(
                f,
                "member {} failed at {} stage (item {}): {}",
                self.index, self.stage, item_id, self.error
            ),
            None => write!(
                f,
                "member {} failed at {} stage: {}",
                self.index, self.stage, self.error
            ),
        }
    }
}

/// Per-run outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchTally {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub strategy: Strategy,
    pub started_at: DateTime<Utc>,
    pub batch_size: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall-clock time from launch until the batch fully drained.
    pub elapsed: Duration,
}
