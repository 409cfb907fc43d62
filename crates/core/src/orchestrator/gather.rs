//! Gather-then-process orchestration.
//!
//! All first-stage fetches run as explicit tasks behind a join barrier. Only
//! once every member has resolved are the outcomes walked in launch order,
//! with second-stage fetches issued one at a time.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::fetch::{FetchError, ItemSource, Stage};

use super::report_failure;
use super::sink::ResultSink;
use super::types::{BatchTally, ItemRecord, MemberFailure};

/// Run one batch, processing members in launch order after the barrier.
///
/// Dropping the returned future aborts all in-flight first-stage tasks.
pub async fn run_gather(
    source: Arc<dyn ItemSource>,
    batch_size: usize,
    sink: &dyn ResultSink,
) -> BatchTally {
    let mut tasks = JoinSet::new();
    for index in 0..batch_size {
        let source = Arc::clone(&source);
        tasks.spawn(async move { (index, source.fetch_item_id().await) });
    }

    let mut outcomes: Vec<Option<Result<i64, FetchError>>> = vec![None; batch_size];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => debug!(error = %e, "First-stage task did not complete"),
        }
    }

    debug!(batch_size, "First stage drained");

    let mut tally = BatchTally::default();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        // A task that panicked left its slot empty.
        let outcome = outcome.unwrap_or_else(|| {
            Err(FetchError::Aborted(
                "task ended without reporting an outcome".to_string(),
            ))
        });

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

    tally
}
