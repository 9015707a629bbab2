//! Page model errors.

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by page operations.
///
/// These mirror the DOM exceptions a content script has to tolerate: a node
/// that went away, a blocked canvas read, an API the host does not offer.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Node no longer exists: {0:?}")]
    NodeGone(NodeId),

    #[error("Node is not an element: {0:?}")]
    NotAnElement(NodeId),

    #[error("Element is not a media element: {0:?}")]
    NotMedia(NodeId),

    #[error("Hierarchy request error: {0}")]
    Hierarchy(String),

    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),

    #[error("Style unavailable for {0:?}")]
    StyleUnavailable(NodeId),

    #[error("Canvas is tainted by cross-origin data")]
    CanvasTainted,

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("Audio processing is not supported by this host")]
    AudioUnsupported,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for page operations.
pub type PageResult<T> = Result<T, PageError>;
