//! Completion-order orchestration.
//!
//! Every first-stage fetch runs as its own task and reports `(index, outcome)`
//! on a completion channel. The orchestrator drains the channel in arrival
//! order and chains the second stage for each success while the remaining
//! first-stage tasks keep running.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use crate::fetch::{FetchError, ItemSource, Stage};

use super::sink::ResultSink;
use super::types::{BatchTally, ItemRecord, MemberFailure};
use super::report_failure;

type Completion = (usize, Result<i64, FetchError>);

/// Run one batch, processing members in completion order.
///
/// Both first- and second-stage failures are isolated to their member.
/// Dropping the returned future aborts all in-flight first-stage tasks.
pub async fn run_as_completed(
    source: Arc<dyn ItemSource>,
    batch_size: usize,
    sink: &dyn ResultSink,
) -> BatchTally {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut tasks = JoinSet::new();

    for index in 0..batch_size {
        let source = Arc::clone(&source);
        let tx = tx.clone();
        tasks.spawn(async move {
            let outcome = source.fetch_item_id().await;
            // Receiver only goes away when the run itself is dropped.
            let _ = tx.send((index, outcome));
        });
    }
    drop(tx);

    debug!(batch_size, "Launched first-stage tasks");

    let mut tally = BatchTally::default();
    let mut reported = vec![false; batch_size];

    while let Some((index, outcome)) = rx.recv().await {
        reported[index] = true;

        let item_id = match outcome {
            Ok(item_id) => item_id,
            Err(error) => {
                report_failure(
                    sink,
                    &mut tally,
                    MemberFailure {
                        index,
                        stage: Stage::First,
                        item_id: None,
                        error,
                    },
                );
                continue;
            }
        };

        match source.fetch_item(item_id).await {
            Ok(body) => {
                sink.record(&ItemRecord {
                    index,
                    item_id,
                    body,
                });
                tally.succeeded += 1;
            }
            Err(error) => report_failure(
                sink,
                &mut tally,
                MemberFailure {
                    index,
                    stage: Stage::Second,
                    item_id: Some(item_id),
                    error,
                },
            ),
        }
    }

    // A task that panicked dropped its sender without reporting.
    for (index, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
        report_failure(
            sink,
            &mut tally,
            MemberFailure {
                index,
                stage: Stage::First,
                item_id: None,
                error: FetchError::Aborted("task ended without reporting an outcome".to_string()),
            },
        );
    }

    while tasks.join_next().await.is_some() {}

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CollectingSink, MockItemSource};
    use std::collections::HashSet;
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_members_succeed() {
        let source = Arc::new(MockItemSource::sequential(20));
        let sink = CollectingSink::new();

        let tally = run_as_completed(source.clone(), 20, &sink).await;

        assert_eq!(tally.succeeded, 20);
        assert_eq!(tally.failed, 0);
        assert_eq!(sink.records().len(), 20);
        assert!(sink.failures().is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_completion_order() {
        // Member 0 is the slowest, member 2 the fastest.
        let source = Arc::new(
            MockItemSource::sequential(3)
                .with_first_stage_delay(0, Duration::from_millis(120))
                .with_first_stage_delay(1, Duration::from_millis(60))
                .with_first_stage_delay(2, Duration::from_millis(5)),
        );
        let sink = CollectingSink::new();

        run_as_completed(source, 3, &sink).await;

        let order: Vec<usize> = sink.records().iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let source = Arc::new(MockItemSource::sequential(10).failing_first_stage(4));
        let sink = CollectingSink::new();

        let tally = run_as_completed(source.clone(), 10, &sink).await;

        assert_eq!(tally.succeeded, 9);
        assert_eq!(tally.failed, 1);
        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 4);
        assert_eq!(failures[0].stage, Stage::First);

        // No second stage was attempted for the failed member.
        assert_eq!(source.second_stage_calls().len(), 9);
        assert!(!source.second_stage_calls().contains(&5));
    }

    #[tokio::test]
    async fn test_second_stage_failure_is_isolated() {
        let source = Arc::new(MockItemSource::sequential(5).failing_item(3));
        let sink = CollectingSink::new();

        let tally = run_as_completed(source, 5, &sink).await;

        assert_eq!(tally.succeeded, 4);
        assert_eq!(tally.failed, 1);
        let failure = &sink.failures()[0];
        assert_eq!(failure.stage, Stage::Second);
        assert_eq!(failure.item_id, Some(3));

        let ids: HashSet<i64> = sink.records().iter().map(|r| r.item_id).collect();
        assert_eq!(ids, HashSet::from([1, 2, 4, 5]));
    }

    #[tokio::test]
    async fn test_panicking_member_is_reported_as_aborted() {
        let source = Arc::new(MockItemSource::sequential(4).panicking_first_stage(1));
        let sink = CollectingSink::new();

        let tally = run_as_completed(source, 4, &sink).await;

        assert_eq!(tally.succeeded, 3);
        assert_eq!(tally.failed, 1);
        let failure = &sink.failures()[0];
        assert_eq!(failure.index, 1);
        assert!(matches!(failure.error, FetchError::Aborted(_)));
    }

    #[tokio::test]
    async fn test_session_released_after_run() {
        let source = Arc::new(MockItemSource::sequential(8).failing_first_stage(0));
        let sink = CollectingSink::new();

        run_as_completed(source.clone(), 8, &sink).await;

        assert_eq!(Arc::strong_count(&source), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let source = Arc::new(MockItemSource::sequential(0));
        let sink = CollectingSink::new();

        let tally = run_as_completed(source, 0, &sink).await;

        assert_eq!(tally, BatchTally::default());
        assert!(sink.records().is_empty());
    }
}
