//! Error types for the host seams.

mod messaging;
mod storage;

pub use messaging::*;
pub use storage::*;
