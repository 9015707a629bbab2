//! Background coordinator.
//!
//! Turns settings changes into `applyOptimizations` messages for every open
//! tab. Delivery is best-effort: one tab failing never holds up the rest.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use lightfps_config::Settings;
use lightfps_protocols::{
    RuntimeMessage, SettingsChange, SettingsStore, StorageArea, TabMessenger, TabQuery,
};

use crate::error::CoordinatorResult;

/// Delivery tallies for one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Tabs the host listed.
    pub tabs: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Tabs without an id, which cannot receive messages.
    pub skipped: usize,
}

/// What a change batch led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Wrong storage area, or no key the engine reads.
    Ignored,
    Broadcast(BroadcastReport),
}

#[derive(Clone)]
pub struct Coordinator {
    messenger: Arc<dyn TabMessenger>,
}

impl Coordinator {
    pub fn new(messenger: Arc<dyn TabMessenger>) -> Self {
        Self { messenger }
    }

    /// React to one change batch.
    ///
    /// Only `sync`-area changes touching an engine key fan out. A failed tab
    /// query is returned as an error; per-tab delivery failures are counted.
    pub async fn on_settings_changed(
        &self,
        change: &SettingsChange,
    ) -> CoordinatorResult<ChangeOutcome> {
        if change.area != StorageArea::Sync {
            debug!("Ignoring {} storage change", change.area);
            return Ok(ChangeOutcome::Ignored);
        }
        if !change.touches(&Settings::KEYS) {
            debug!("Ignoring change to unrelated keys");
            return Ok(ChangeOutcome::Ignored);
        }

        let tabs = match self.messenger.query_tabs(TabQuery::all()).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("Error querying tabs: {}", e);
                return Err(e.into());
            }
        };

        let mut report = BroadcastReport {
            tabs: tabs.len(),
            ..BroadcastReport::default()
        };
        let ids: Vec<_> = tabs.iter().filter_map(|tab| tab.id).collect();
        report.skipped = tabs.len() - ids.len();

        let deliveries = ids.iter().map(|&id| async move {
            let result = self
                .messenger
                .send_message(id, RuntimeMessage::apply_optimizations())
                .await;
            (id, result)
        });
        for (id, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to send message to tab {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Broadcast applyOptimizations to {} tab(s), {} failed",
            report.delivered, report.failed
        );
        Ok(ChangeOutcome::Broadcast(report))
    }

    /// Follow `store`'s change feed until it closes. Returns the number of
    /// broadcasts sent.
    ///
    /// The feed is subscribed before the returned future is first polled, so
    /// changes written right after this call are not missed.
    pub fn run(
        &self,
        store: &dyn SettingsStore,
    ) -> impl Future<Output = usize> + Send + 'static {
        let feed = store.subscribe();
        let coordinator = self.clone();
        async move { coordinator.listen(feed).await }
    }

    /// Follow an already subscribed change feed until it closes.
    pub async fn listen(&self, mut feed: broadcast::Receiver<SettingsChange>) -> usize {
        info!("Coordinator listening for settings changes");
        let mut broadcasts = 0;
        loop {
            match feed.recv().await {
                Ok(change) => match self.on_settings_changed(&change).await {
                    Ok(ChangeOutcome::Broadcast(_)) => broadcasts += 1,
                    Ok(ChangeOutcome::Ignored) => {}
                    Err(e) => warn!("Settings change not broadcast: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Settings feed lagged, missed {} change batches", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Settings feed closed, stopping coordinator");
                    break;
                }
            }
        }
        broadcasts
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
