//! Run entry points: strategy dispatch, timing and session scoping.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::fetch::{HttpSession, ItemSource};
use crate::metrics;

use super::as_completed::run_as_completed;
use super::gather::run_gather;
use super::sink::ResultSink;
use super::types::{OrchestratorError, RunReport, Strategy};

/// Run one batch with the given strategy against `source`.
///
/// Member failures are reported through `sink` and counted in the report;
/// the run itself cannot fail.
pub async fn run_batch(
    strategy: Strategy,
    source: Arc<dyn ItemSource>,
    batch_size: usize,
    sink: &dyn ResultSink,
) -> RunReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let start = Instant::now();
    let span = info_span!("batch_run", %run_id, %strategy, batch_size);

    let tally = async {
        info!("Starting batch run");
        match strategy {
            Strategy::AsCompleted => run_as_completed(source, batch_size, sink).await,
            Strategy::Gather => run_gather(source, batch_size, sink).await,
        }
    }
    .instrument(span.clone())
    .await;

    let elapsed = start.elapsed();
    debug_assert_eq!(tally.total(), batch_size);
    metrics::record_batch(strategy, tally.succeeded, tally.failed);

    span.in_scope(|| {
        info!(
            succeeded = tally.succeeded,
            failed = tally.failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch run complete"
        );
    });

    RunReport {
        run_id,
        strategy,
        started_at,
        batch_size,
        succeeded: tally.succeeded,
        failed: tally.failed,
        elapsed,
    }
}

/// Open an HTTP session from `config`, run the configured strategy, close it.
///
/// The session lives exactly as long as this call; it is released on every
/// exit path, including when the returned future is dropped early.
pub async fn run_with_session(
    config: &Config,
    sink: &dyn ResultSink,
) -> Result<RunReport, OrchestratorError> {
    let session: Arc<dyn ItemSource> =
        Arc::new(HttpSession::new(&config.endpoints, &config.client)?);

    let report = run_batch(config.batch.strategy, session, config.batch.size, sink).await;

    Ok(report)
}
