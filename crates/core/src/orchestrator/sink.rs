//! Destinations for emitted results.

use std::io::{self, Write};
use std::sync::Mutex;

use tracing::warn;

use super::types::{ItemRecord, MemberFailure};

/// Receives every outcome of a run, one call per batch member.
///
/// Calls happen on the orchestrating task, in emission order.
pub trait ResultSink: Send + Sync {
    /// A member's chained second-stage result.
    fn record(&self, record: &ItemRecord);

    /// A member's captured failure.
    fn failure(&self, failure: &MemberFailure);
}

/// Writes one line per outcome.
///
/// Records are written as compact JSON, failures as an `error:` diagnostic
/// with any line breaks in the message folded into spaces.
pub struct LineSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to write output line: {}", e);
        }
    }
}

impl<W: Write + Send> ResultSink for LineSink<W> {
    fn record(&self, record: &ItemRecord) {
        self.write_line(&record.body.to_string());
    }

    fn failure(&self, failure: &MemberFailure) {
        let message = failure.to_string();
        let message: Vec<&str> = message
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        self.write_line(&format!("error: {}", message.join(" ")));
    }
}

/// Line sink over standard output.
pub type StdoutSink = LineSink<io::Stdout>;

impl Default for StdoutSink {
    fn default() -> Self {
        LineSink::new(io::stdout())
    }
}
