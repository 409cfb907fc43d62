//! Mock item source for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::fetch::{FetchError, ItemSource, Stage};

/// Mock implementation of the ItemSource trait.
///
/// Behavior is keyed by first-stage *call number* (0-based, in the order
/// calls begin executing) and by item id for the second stage:
/// - Return scripted identifiers
/// - Fail, panic or delay specific first-stage calls
/// - Fail specific second-stage items
/// - Record calls for assertions
///
/// Second-stage bodies are `{"name": "item-<id>"}`.
///
/// # Example
///
/// ```rust,ignore
/// use chainfetch_core::testing::{CollectingSink, MockItemSource};
///
/// let source = Arc::new(MockItemSource::sequential(10).failing_first_stage(4));
/// let sink = CollectingSink::new();
///
/// run_as_completed(source.clone(), 10, &sink).await;
/// assert_eq!(sink.records().len(), 9);
/// assert_eq!(source.second_stage_calls().len(), 9);
/// ```
#[derive(Debug, Default)]
pub struct MockItemSource {
    /// Identifiers returned by successive first-stage calls.
    ids: Vec<i64>,
    failing_first: HashSet<usize>,
    panicking_first: HashSet<usize>,
    first_delays: HashMap<usize, Duration>,
    failing_items: HashSet<i64>,
    first_calls: AtomicUsize,
    second_calls: Mutex<Vec<i64>>,
    events: Mutex<Vec<(Stage, i64)>>,
}

impl MockItemSource {
    /// Create a mock returning the given identifiers, one per call.
    ///
    /// Calls past the end of the list wrap around.
    pub fn with_ids(ids: Vec<i64>) -> Self {
        Self {
            ids,
            ..Default::default()
        }
    }

    /// Create a mock returning identifiers `1..=n`.
    pub fn sequential(n: usize) -> Self {
        Self::with_ids((1..=n as i64).collect())
    }

    /// Make first-stage call `call` fail with an HTTP 500.
    pub fn failing_first_stage(mut self, call: usize) -> Self {
        self.failing_first.insert(call);
        self
    }

    /// Make first-stage call `call` panic.
    pub fn panicking_first_stage(mut self, call: usize) -> Self {
        self.panicking_first.insert(call);
        self
    }

    /// Delay first-stage call `call` before it resolves.
    pub fn with_first_stage_delay(mut self, call: usize, delay: Duration) -> Self {
        self.first_delays.insert(call, delay);
        self
    }

    /// Make the second-stage fetch for `item_id` fail with an HTTP 500.
    pub fn failing_item(mut self, item_id: i64) -> Self {
        self.failing_items.insert(item_id);
        self
    }

    /// Number of first-stage calls started so far.
    pub fn first_stage_call_count(&self) -> usize {
        self.first_calls.load(Ordering::SeqCst)
    }

    /// Item ids passed to the second stage, in call order.
    pub fn second_stage_calls(&self) -> Vec<i64> {
        lock(&self.second_calls).clone()
    }

    /// First-stage completions `(First, call)` and second-stage starts
    /// `(Second, item_id)`, interleaved in the order they happened.
    pub fn events(&self) -> Vec<(Stage, i64)> {
        lock(&self.events).clone()
    }

    fn id_for_call(&self, call: usize) -> i64 {
        if self.ids.is_empty() {
            call as i64 + 1
        } else {
            self.ids[call % self.ids.len()]
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ItemSource for MockItemSource {
    async fn fetch_item_id(&self) -> Result<i64, FetchError> {
        let call = self.first_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.first_delays.get(&call) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        if self.panicking_first.contains(&call) {
            panic!("mock first-stage panic for call {}", call);
        }

        lock(&self.events).push((Stage::First, call as i64));

        if self.failing_first.contains(&call) {
            return Err(FetchError::Status {
                status: 500,
                body: format!("mock failure for call {}", call),
            });
        }

        Ok(self.id_for_call(call))
    }

    async fn fetch_item(&self, item_id: i64) -> Result<Value, FetchError> {
        lock(&self.second_calls).push(item_id);
        lock(&self.events).push((Stage::Second, item_id));

        tokio::task::yield_now().await;

        if self.failing_items.contains(&item_id) {
            return Err(FetchError::Status {
                status: 500,
                body: format!("mock failure for item {}", item_id),
            });
        }

        Ok(json!({ "name": format!("item-{}", item_id) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_ids() {
        let source = MockItemSource::sequential(3);
        assert_eq!(source.fetch_item_id().await.unwrap(), 1);
        assert_eq!(source.fetch_item_id().await.unwrap(), 2);
        assert_eq!(source.fetch_item_id().await.unwrap(), 3);
        assert_eq!(source.fetch_item_id().await.unwrap(), 1);
        assert_eq!(source.first_stage_call_count(), 4);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let source = MockItemSource::with_ids(vec![10, 20])
            .failing_first_stage(0)
            .failing_item(20);

        assert!(source.fetch_item_id().await.is_err());
        assert_eq!(source.fetch_item_id().await.unwrap(), 20);
        assert!(source.fetch_item(20).await.is_err());
        assert_eq!(
            source.fetch_item(10).await.unwrap(),
            json!({"name": "item-10"})
        );
        assert_eq!(source.second_stage_calls(), vec![20, 10]);
    }
}
