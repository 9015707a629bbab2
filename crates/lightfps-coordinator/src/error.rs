//! Coordinator errors.

use lightfps_protocols::{MessagingError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Messaging failed: {0}")]
    Messaging(#[from] MessagingError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
