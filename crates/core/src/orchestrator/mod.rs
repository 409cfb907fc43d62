//! Batch orchestration.
//!
//! A run launches N first-stage fetches at once and chains a second-stage
//! fetch off every success. Two strategies are available:
//! - **As-completed**: members are processed in completion order, chaining
//!   while the rest of the batch is still in flight.
//! - **Gather**: the whole first stage drains behind a barrier, then members
//!   are chained one at a time in launch order.
//!
//! A member's failure is always captured and reported; it never cancels or
//! delays the rest of the batch.

mod as_completed;
mod gather;
mod runner;
mod sink;
mod types;

pub use as_completed::run_as_completed;
pub use gather::run_gather;
pub use runner::{run_batch, run_with_session};
pub use sink::{LineSink, ResultSink, StdoutSink};
pub use types::{BatchTally, ItemRecord, MemberFailure, OrchestratorError, RunReport, Strategy};

use tracing::warn;

/// Log a member failure, hand it to the sink and count it.
fn report_failure(sink: &dyn ResultSink, tally: &mut BatchTally, failure: MemberFailure) {
    warn!(
        index = failure.index,
        stage = %failure.stage,
        item_id = ?failure.item_id,
        error = %failure.error,
        "Batch member failed"
    );
    sink.failure(&failure);
    tally.failed += 1;
}
