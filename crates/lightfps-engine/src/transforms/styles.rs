//! Page-wide style blocks, each injected at most once.

use lightfps_page::Document;

use super::{inject_style, style_parent};
use crate::report::{Step, StepReport};

/// A `<style>` block identified by its element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleAsset {
    pub id: &'static str,
    pub css: &'static str,
}

pub const DISABLE_ANIMATIONS: StyleAsset = StyleAsset {
    id: "disable-animations-style",
    css: "*, *::before, *::after { animation-play-state: paused !important; \
          animation-duration: 0.001s !important; transition-duration: 0.001s !important; }",
};

pub const REDUCE_MOTION: StyleAsset = StyleAsset {
    id: "reduce-motion-style",
    css: "*, *::before, *::after { animation-play-state: paused !important; \
          animation-duration: 0.001s !important; transition-duration: 0.001s !important; \
          scroll-behavior: auto !important; } \
          body { scroll-behavior: auto !important; }",
};

pub const FONT_SMOOTHING: StyleAsset = StyleAsset {
    id: "font-smoothing-style",
    css: "body, input, textarea, select { -webkit-font-smoothing: antialiased !important; \
          -moz-osx-font-smoothing: grayscale !important; \
          text-rendering: optimizeLegibility !important; }",
};

/// Inject `asset` unless the page already has it.
pub fn apply(doc: &mut Document, step: Step, asset: StyleAsset) -> StepReport {
    let mut report = StepReport::default();
    let anchor = style_parent(doc);
    report.record(step, anchor, inject_style(doc, asset.id, asset.css));
    report
}
