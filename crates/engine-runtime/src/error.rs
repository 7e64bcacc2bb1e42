use connectors::error::AdapterError;
use thiserror::Error;

/// Errors that stop a whole run, as opposed to a single table failing.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Adapter-related error.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// An initializer task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
