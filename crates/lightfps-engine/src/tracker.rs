//! Tracker and ad suppression.
//!
//! Two strategies, chosen in [`TrackerConfig`]:
//!
//! - **Deferred**: matches are hidden at once and removed after a grace
//!   delay; page mutations trigger a debounced rescan.
//! - **Immediate**: matches are removed on sight; every batch of added
//!   nodes triggers a rescan, an interval backs that up, and configured
//!   ad globals are nulled out.
//!
//! Tracking cookies are expired on every run in both modes.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};
use std::time::Duration;

use lightfps_config::{TrackerConfig, TrackerStrategy};
use lightfps_page::{NodeId, PageResult, SelectorList};
use lightfps_runloop::{Debounce, ObserveOptions, ObserverId, RunLoop, TimerId};
use tracing::{debug, info, warn};

use crate::report::{Step, StepReport};
use crate::transforms::{body_parent, compile_selectors, matching};

const EXPIRED: &str = "expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/";

#[derive(Default)]
struct TrackerState {
    observer: Option<ObserverId>,
    rescan: Option<TimerId>,
    debounce: Option<Debounce<RunLoop>>,
    /// Grace-delay removals still waiting to fire.
    removals: Vec<TimerId>,
}

struct Inner {
    config: TrackerConfig,
    selectors: Vec<SelectorList>,
    state: RefCell<TrackerState>,
}

#[derive(Clone)]
pub struct TrackerSuppressor {
    inner: Rc<Inner>,
}

impl TrackerSuppressor {
    pub fn new(config: TrackerConfig) -> Self {
        let selectors = compile_selectors("tracker.selectors", &config.selectors);
        Self {
            inner: Rc::new(Inner {
                config,
                selectors,
                state: RefCell::new(TrackerState::default()),
            }),
        }
    }

    pub fn strategy(&self) -> TrackerStrategy {
        self.inner.config.strategy
    }

    /// Whether an observer or rescan interval is installed.
    pub fn is_active(&self) -> bool {
        let state = self.inner.state.borrow();
        state.observer.is_some() || state.rescan.is_some()
    }

    /// Scan now, clear cookies and (re)install the watchers.
    pub fn apply(&self, rl: &mut RunLoop) -> StepReport {
        self.stop_watchers(rl);
        let mut report = self.inner.scan(rl);
        if self.strategy() == TrackerStrategy::Immediate {
            report.applied += self.null_ad_globals(rl);
        }
        report.applied += self.clear_cookies(rl);
        self.install(rl);
        report
    }

    /// Remove the watchers and cancel grace removals still pending. Elements
    /// already hidden stay hidden.
    pub fn stop(&self, rl: &mut RunLoop) {
        self.stop_watchers(rl);
        let removals = std::mem::take(&mut self.inner.state.borrow_mut().removals);
        let cancelled = removals.into_iter().filter(|id| rl.clear_timer(*id)).count();
        if cancelled > 0 {
            debug!(cancelled, "pending tracker removals cancelled");
        }
    }

    /// Grace-delay removals scheduled and not yet fired.
    pub fn pending_removals(&self, rl: &RunLoop) -> usize {
        let state = self.inner.state.borrow();
        state.removals.iter().filter(|id| rl.has_timer(**id)).count()
    }

    /// Remove the observer, rescan interval and any pending debounced scan.
    fn stop_watchers(&self, rl: &mut RunLoop) {
        let mut state = self.inner.state.borrow_mut();
        if let Some(id) = state.observer.take() {
            rl.disconnect(id);
        }
        if let Some(id) = state.rescan.take() {
            rl.clear_timer(id);
        }
        if let Some(debounce) = state.debounce.take() {
            debounce.cancel(rl);
        }
    }

    fn install(&self, rl: &mut RunLoop) {
        let root = body_parent(rl.document());
        let weak = Rc::downgrade(&self.inner);
        let observed = match self.strategy() {
            TrackerStrategy::Deferred => {
                let scan = weak.clone();
                let debounce = Debounce::new(
                    Duration::from_millis(self.inner.config.debounce_ms),
                    move |rl: &mut RunLoop| rescan(&scan, rl),
                );
                let trigger = debounce.clone();
                self.inner.state.borrow_mut().debounce = Some(debounce);
                rl.observe(root, ObserveOptions::subtree(), move |rl, _| trigger.trigger(rl))
            }
            TrackerStrategy::Immediate => {
                let scan = weak.clone();
                let interval = rl.set_interval(
                    Duration::from_millis(self.inner.config.rescan_interval_ms),
                    move |rl| rescan(&scan, rl),
                );
                self.inner.state.borrow_mut().rescan = Some(interval);
                rl.observe(root, ObserveOptions::subtree(), move |rl, records| {
                    if records.iter().any(|record| !record.added.is_empty()) {
                        rescan(&weak, rl);
                    }
                })
            }
        };
        match observed {
            Ok(id) => {
                self.inner.state.borrow_mut().observer = Some(id);
                info!(strategy = ?self.strategy(), "tracker observer installed");
            }
            Err(e) => warn!(error = %e, "tracker observer not installed"),
        }
    }

    /// Expire tracking cookies. Returns how many names were cleared.
    fn clear_cookies(&self, rl: &mut RunLoop) -> usize {
        let config = &self.inner.config;
        let names: BTreeSet<String> = rl
            .window()
            .cookies()
            .live()
            .map(|cookie| cookie.name.clone())
            .filter(|name| self.is_tracking_cookie(name))
            .collect();

        let jar = rl.window_mut().cookies_mut();
        for name in &names {
            let expired = format!("{name}=; {EXPIRED}");
            let mut headers = vec![expired.clone()];
            if let Some(domain) = &config.cookie_domain {
                headers.push(format!("{expired}; domain={domain}"));
            }
            for header in headers {
                if let Err(e) = jar.set_cookie(&header) {
                    debug!(cookie = %name, error = %e, "cookie not cleared");
                }
            }
        }
        if !names.is_empty() {
            debug!(count = names.len(), "tracking cookies cleared");
        }
        names.len()
    }

    pub fn is_tracking_cookie(&self, name: &str) -> bool {
        let config = &self.inner.config;
        let lower = name.to_ascii_lowercase();
        config
            .cookie_patterns
            .iter()
            .any(|pattern| lower.contains(&pattern.to_ascii_lowercase()))
            || (config.clear_extended_cookies
                && config.extended_cookie_names.iter().any(|n| n == name))
    }

    fn null_ad_globals(&self, rl: &mut RunLoop) -> usize {
        let window = rl.window_mut();
        let mut nulled = 0;
        for path in &self.inner.config.ad_globals {
            if window.global(path).is_some_and(|v| !v.is_null()) && window.null_global(path) {
                nulled += 1;
            }
        }
        nulled
    }
}

impl Inner {
    fn scan(&self, rl: &mut RunLoop) -> StepReport {
        let mut report = StepReport::default();
        let grace = Duration::from_millis(self.config.grace_ms);
        for id in matching(rl.document(), &self.selectors) {
            let outcome = match self.config.strategy {
                TrackerStrategy::Deferred => self.hide_then_remove(rl, id, grace),
                TrackerStrategy::Immediate => Ok(rl.document_mut().remove(id)),
            };
            report.record(Step::Tracker, id, outcome);
        }
        report
    }

    fn hide_then_remove(&self, rl: &mut RunLoop, id: NodeId, grace: Duration) -> PageResult<bool> {
        if rl.document().style(id, "visibility").as_deref() == Some("hidden") {
            return Ok(false);
        }
        rl.document_mut().set_style(id, "visibility", "hidden")?;
        let timer = rl.set_timeout(grace, move |rl| {
            rl.document_mut().remove(id);
        });
        let mut state = self.state.borrow_mut();
        state.removals.retain(|pending| rl.has_timer(*pending));
        state.removals.push(timer);
        Ok(true)
    }
}

fn rescan(inner: &Weak<Inner>, rl: &mut RunLoop) {
    if let Some(inner) = inner.upgrade() {
        let report = inner.scan(rl);
        if report.applied > 0 {
            debug!(removed = report.applied, "tracker rescan");
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
