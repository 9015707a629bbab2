//! Reduce memory: hide heavy page regions and unload ad/embed iframes.

use std::cell::RefCell;
use std::time::Duration;

use lightfps_config::ReduceMemoryConfig;
use lightfps_page::{NodeId, PageResult, SelectorList};
use lightfps_runloop::{RunLoop, TimerId};
use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use super::{compile_selectors, elements, hide_matching};
use crate::error::{EngineError, EngineResult};
use crate::report::{Step, StepReport};

pub struct ReduceMemory {
    hide: Vec<SelectorList>,
    iframe_pattern: Regex,
    removal_delay: Duration,
    removals: RefCell<Vec<TimerId>>,
}

impl ReduceMemory {
    pub fn new(config: &ReduceMemoryConfig) -> EngineResult<Self> {
        let iframe_pattern = RegexBuilder::new(&config.iframe_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| EngineError::Config {
                field: "reduce_memory.iframe_pattern".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            hide: compile_selectors("reduce_memory.hide_selectors", &config.hide_selectors),
            iframe_pattern,
            removal_delay: Duration::from_millis(config.iframe_removal_delay_ms),
            removals: RefCell::new(Vec::new()),
        })
    }

    pub fn apply(&self, rl: &mut RunLoop) -> StepReport {
        let mut report = hide_matching(rl.document_mut(), &self.hide, Step::ReduceMemory);
        for id in elements(rl.document(), "iframe") {
            let outcome = self.unload_iframe(rl, id);
            report.record(Step::ReduceMemory, id, outcome);
        }
        report
    }

    /// Blank a matching iframe now and detach it after the delay.
    fn unload_iframe(&self, rl: &mut RunLoop, id: NodeId) -> PageResult<bool> {
        let src = rl.document().attr(id, "src").unwrap_or_default();
        if !self.iframe_pattern.is_match(src) {
            return Ok(false);
        }
        rl.document_mut().set_attr(id, "src", "about:blank")?;
        let timer = rl.set_timeout(self.removal_delay, move |rl| {
            if rl.document_mut().remove(id) {
                trace!(iframe = ?id, "unloaded iframe removed");
            }
        });
        let mut removals = self.removals.borrow_mut();
        removals.retain(|pending| rl.has_timer(*pending));
        removals.push(timer);
        Ok(true)
    }

    /// Cancel iframe removals that have not fired yet. The iframes stay
    /// blanked.
    pub fn cancel(&self, rl: &mut RunLoop) {
        let removals = self.removals.take();
        let cancelled = removals.into_iter().filter(|id| rl.clear_timer(*id)).count();
        if cancelled > 0 {
            debug!(cancelled, "pending iframe removals cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfps_page::Window;
    use lightfps_page::html::parse_html;

    fn page() -> RunLoop {
        let doc = parse_html(
            r#"<div id="comments">c</div>
               <iframe id=ad src="https://DoubleClick.net/x"></iframe>
               <iframe id=doc src="https://example.com/docs"></iframe>
               <link rel="preload" href="a.js">"#,
        );
        RunLoop::new(Window::new(doc))
    }

    #[test]
    fn test_hides_and_unloads() {
        let mut rl = page();
        let engine = ReduceMemory::new(&ReduceMemoryConfig::default()).unwrap();
        let report = engine.apply(&mut rl);
        assert_eq!(report.applied, 3);

        let doc = rl.document();
        let comments = doc.get_element_by_id("comments").unwrap();
        assert_eq!(doc.style(comments, "display").as_deref(), Some("none"));
        let ad = doc.get_element_by_id("ad").unwrap();
        assert_eq!(doc.attr(ad, "src"), Some("about:blank"));
        let kept = doc.get_element_by_id("doc").unwrap();
        assert_eq!(doc.attr(kept, "src"), Some("https://example.com/docs"));
    }

    #[test]
    fn test_iframe_removed_after_delay() {
        let mut rl = page();
        let engine = ReduceMemory::new(&ReduceMemoryConfig::default()).unwrap();
        engine.apply(&mut rl);
        let ad = rl.document().get_element_by_id("ad").unwrap();

        rl.advance_ms(2999).unwrap();
        assert!(rl.document().is_alive(ad));
        rl.advance_ms(1).unwrap();
        assert!(!rl.document().is_alive(ad));
    }

    #[test]
    fn test_blank_iframe_not_rescheduled() {
        let mut rl = page();
        let engine = ReduceMemory::new(&ReduceMemoryConfig::default()).unwrap();
        engine.apply(&mut rl);
        let pending = rl.pending_timers();
        engine.apply(&mut rl);
        assert_eq!(rl.pending_timers(), pending);
    }

    #[test]
    fn test_cancel_keeps_blanked_iframe() {
        let mut rl = page();
        let engine = ReduceMemory::new(&ReduceMemoryConfig::default()).unwrap();
        engine.apply(&mut rl);
        let ad = rl.document().get_element_by_id("ad").unwrap();
        assert_eq!(rl.pending_timers(), 1);

        engine.cancel(&mut rl);
        engine.cancel(&mut rl);
        assert_eq!(rl.pending_timers(), 0);
        rl.advance_ms(10_000).unwrap();
        assert!(rl.document().is_alive(ad));
        assert_eq!(rl.document().attr(ad, "src"), Some("about:blank"));
    }

    #[test]
    fn test_bad_pattern_is_a_config_error() {
        let config = ReduceMemoryConfig {
            iframe_pattern: "(ads".to_string(),
            ..ReduceMemoryConfig::default()
        };
        assert!(matches!(
            ReduceMemory::new(&config),
            Err(EngineError::Config { .. })
        ));
    }
}
