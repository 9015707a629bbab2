//! Engine errors.

use lightfps_page::PageError;
use lightfps_runloop::RunLoopError;
use thiserror::Error;

/// Errors that stop an engine call as a whole.
///
/// Per-element failures never surface here; they are logged and counted in
/// the run report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Settings snapshot unavailable: {0}")]
    Snapshot(String),

    #[error("Invalid engine config for {field}: {message}")]
    Config { field: String, message: String },

    #[error("Run loop error: {0}")]
    RunLoop(#[from] RunLoopError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_display() {
        let err = EngineError::Snapshot("storage offline".to_string());
        let display = err.to_string();
        assert!(display.contains("snapshot"));
        assert!(display.contains("storage offline"));
    }

    #[test]
    fn test_config_error_display() {
        let err = EngineError::Config {
            field: "reduce_memory.iframe_pattern".to_string(),
            message: "unclosed group".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("iframe_pattern"));
        assert!(display.contains("unclosed group"));
    }

    #[test]
    fn test_from_page_error() {
        let err = EngineError::from(PageError::AudioUnsupported);
        assert!(matches!(err, EngineError::Page(_)));
        assert!(err.to_string().contains("Audio"));
    }

    #[test]
    fn test_from_run_loop_error() {
        let err = EngineError::from(RunLoopError::MicrotaskLimit(10));
        assert!(matches!(err, EngineError::RunLoop(_)));
    }
}
