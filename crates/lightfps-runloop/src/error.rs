//! Error types for the RunLoop module.

use lightfps_page::{NodeId, PageError};
use thiserror::Error;

/// Errors that can occur in the RunLoop.
#[derive(Debug, Error)]
pub enum RunLoopError {
    /// Listener or observer registration on a node that is gone.
    #[error("Target node no longer exists: {0:?}")]
    DeadTarget(NodeId),

    /// Callbacks kept producing work without the loop going idle.
    #[error("Microtask limit exceeded: {0} deliveries without going idle")]
    MicrotaskLimit(usize),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Page operation failed.
    #[error("Page error: {0}")]
    Page(#[from] PageError),
}

/// Result type for RunLoop operations.
pub type RunLoopResult<T> = Result<T, RunLoopError>;
