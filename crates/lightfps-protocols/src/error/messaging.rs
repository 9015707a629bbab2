//! Tab messaging errors.

use thiserror::Error;

use crate::messaging::TabId;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Tab query failed: {0}")]
    QueryFailed(String),

    #[error("No receiver in tab {0}")]
    NoReceiver(TabId),

    #[error("Tab {0} is closed")]
    TabClosed(TabId),

    #[error("Script injection into tab {tab} failed: {message}")]
    InjectionFailed { tab: TabId, message: String },
}
