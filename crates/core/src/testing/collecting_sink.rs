//! In-memory result sink for testing.

use std::sync::Mutex;

use crate::orchestrator::{ItemRecord, MemberFailure, ResultSink};

/// Sink that keeps every emitted outcome for later assertions.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<ItemRecord>>,
    failures: Mutex<Vec<MemberFailure>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in emission order.
    pub fn records(&self) -> Vec<ItemRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Failures in emission order.
    pub fn failures(&self) -> Vec<MemberFailure> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ResultSink for CollectingSink {
    fn record(&self, record: &ItemRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }

    fn failure(&self, failure: &MemberFailure) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(failure.clone());
    }
}
