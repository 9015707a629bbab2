//! Minimal UI: hide page chrome outright.

use lightfps_config::MinimalUiConfig;
use lightfps_page::{Document, SelectorList};

use super::{compile_selectors, hide_matching};
use crate::report::{Step, StepReport};

pub struct MinimalUi {
    selectors: Vec<SelectorList>,
}

impl MinimalUi {
    pub fn new(config: &MinimalUiConfig) -> Self {
        Self {
            selectors: compile_selectors("minimal_ui.selectors", &config.selectors),
        }
    }

    pub fn apply(&self, doc: &mut Document) -> StepReport {
        hide_matching(doc, &self.selectors, Step::MinimalUi)
    }
}
