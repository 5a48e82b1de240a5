//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// A page request failed; the whole fetch is aborted
    #[error("failed to fetch page {page} of pipeline {pipeline_id}: {source}")]
    PageFetch {
        /// Active pipeline id
        pipeline_id: String,
        /// 1-based page number
        page: u32,
        #[source]
        source: ContractError,
    },

    /// Credential environment variable not set
    #[error("environment variable {var} is not set")]
    MissingToken {
        /// Variable name
        var: String,
    },

    /// HTTP client could not be built
    #[error("failed to build crm client: {message}")]
    ClientSetup {
        /// Error message
        message: String,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
