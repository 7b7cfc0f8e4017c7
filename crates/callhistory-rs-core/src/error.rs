//! Error types for the call history core crate.

use callhistory_rs_protocol::DataSourceError;
use thiserror::Error;

/// Errors returned by core call history operations.
#[derive(Debug, Error)]
pub enum CallHistoryError {
    /// A call log or contact provider failed.
    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),
    /// The suggestion engine task is no longer running.
    #[error("suggestion engine closed")]
    EngineClosed,
}
