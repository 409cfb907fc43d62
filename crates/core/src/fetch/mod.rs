//! Leaf fetch operations.
//!
//! This module provides the `ItemSource` trait for the two request stages:
//! the first stage yields an item identifier, the second stage resolves that
//! identifier to an opaque JSON record. `HttpSession` is the reqwest-backed
//! implementation shared by every member of a batch.

mod session;

pub use session::HttpSession;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two chained requests an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The identifier fetch against the base endpoint.
    First,
    /// The dependent record fetch keyed by identifier.
    Second,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::First => "first",
            Stage::Second => "second",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a single fetch.
///
/// Each error is scoped to exactly one call; orchestrators capture it
/// instead of letting it abort the batch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connect or read timeout exceeded.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure, etc.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body is not the expected structure.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// A required field is absent from the body.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// The member's task ended without reporting an outcome.
    #[error("task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Connection, timeout and other network-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout(_) | FetchError::ConnectionFailed(_) | FetchError::Transport(_)
        )
    }

    /// Body or status did not match the expected shape.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            FetchError::Status { .. } | FetchError::Parse(_) | FetchError::MissingField(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_connect() {
            FetchError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Source of items for a batch run.
///
/// Implementations must be safe for concurrent use by every batch member.
/// Members only borrow the source; none of them may close or reconfigure it.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// First stage: fetch one identifier from the fixed endpoint.
    async fn fetch_item_id(&self) -> Result<i64, FetchError>;

    /// Second stage: fetch the record for `item_id`.
    async fn fetch_item(&self, item_id: i64) -> Result<serde_json::Value, FetchError>;
}

/// Extract the integer `item_id` field from a first-stage body.
pub(crate) fn extract_item_id(body: &serde_json::Value) -> Result<i64, FetchError> {
    let object = body
        .as_object()
        .ok_or_else(|| FetchError::Parse(format!("expected JSON object, got {}", body)))?;

    let value = object
        .get("item_id")
        .ok_or_else(|| FetchError::MissingField("item_id".to_string()))?;

    value
        .as_i64()
        .ok_or_else(|| FetchError::Parse(format!("item_id is not an integer: {}", value)))
}
