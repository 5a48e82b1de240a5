//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A sink rejected a partner table; the remaining sinks were not attempted
    #[error("sink '{sink_name}' failed to publish sheet '{sheet_name}': {source}")]
    Publish {
        sink_name: String,
        sheet_name: String,
        #[source]
        source: contracts::ContractError,
    },

    /// Sink error outside a publish, e.g. while closing
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
