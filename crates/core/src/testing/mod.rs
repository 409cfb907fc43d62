//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable `ItemSource` and an in-memory
//! `ResultSink`, allowing orchestration to be tested without a server.
//!
//! # Example
//!
//! ```rust,ignore
//! use chainfetch_core::testing::{CollectingSink, MockItemSource};
//!
//! let source = Arc::new(MockItemSource::sequential(5).failing_item(3));
//! let sink = CollectingSink::new();
//!
//! let report = run_batch(Strategy::Gather, source, 5, &sink).await;
//! assert_eq!(report.failed, 1);
//! ```

mod collecting_sink;
mod mock_item_source;

pub use collecting_sink::CollectingSink;
pub use mock_item_source::MockItemSource;
