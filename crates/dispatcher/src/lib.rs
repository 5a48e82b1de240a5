//! # Dispatcher
//!
//! Sheet publishing.
//!
//! Responsibilities:
//! - Build the configured sinks (`log`, `file`, `google_sheets`)
//! - Publish each partner table to every sink, in order
//! - Stop at the first failure; earlier tables stay published

pub mod error;
pub mod metrics;
pub mod publisher;
pub mod sinks;

pub use contracts::{SheetSink, SheetTable};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use publisher::{create_publisher, create_sink, PublishSummary, Publisher};
pub use sinks::{AnySink, FileSink, GoogleSheetsSink, LogSink};
