//! DOM transforms.
//!
//! Each transform is safe to run any number of times: it checks before it
//! writes, and singleton assets are looked up by their fixed id first.
//! A failure on one element is recorded in the step report and the pass
//! moves on.

pub mod dark_mode;
pub mod gif_freeze;
pub mod lazy_load;
pub mod minimal_ui;
pub mod reduce_memory;
pub mod sharpen;
pub mod styles;

use lightfps_page::{Document, NodeId, PageResult, SelectorList};
use tracing::warn;

use crate::report::{Step, StepReport};

/// Elements matching a built-in selector.
pub(crate) fn elements(doc: &Document, selector: &str) -> Vec<NodeId> {
    doc.query_selector_all(selector).unwrap_or_default()
}

/// Compile configured selectors, dropping the ones the page model cannot
/// match.
pub(crate) fn compile_selectors(field: &str, selectors: &[String]) -> Vec<SelectorList> {
    selectors
        .iter()
        .filter_map(|selector| match SelectorList::parse(selector) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(field, selector = %selector, error = %e, "selector ignored");
                None
            }
        })
        .collect()
}

/// Every element matching any of `lists`, in list order, without repeats.
pub(crate) fn matching(doc: &Document, lists: &[SelectorList]) -> Vec<NodeId> {
    let mut found = Vec::new();
    for list in lists {
        for id in doc.select(doc.root(), list) {
            if !found.contains(&id) {
                found.push(id);
            }
        }
    }
    found
}

/// Where injected `<style>` blocks go.
pub(crate) fn style_parent(doc: &Document) -> NodeId {
    doc.head()
        .or_else(|| doc.document_element())
        .unwrap_or_else(|| doc.root())
}

/// Where injected body-level assets go.
pub(crate) fn body_parent(doc: &Document) -> NodeId {
    doc.body()
        .or_else(|| doc.document_element())
        .unwrap_or_else(|| doc.root())
}

/// `display: none` on every match.
pub(crate) fn hide_matching(doc: &mut Document, lists: &[SelectorList], step: Step) -> StepReport {
    let mut report = StepReport::default();
    for id in matching(doc, lists) {
        let outcome = hide(doc, id);
        report.record(step, id, outcome);
    }
    report
}

fn hide(doc: &mut Document, id: NodeId) -> PageResult<bool> {
    if doc.style(id, "display").as_deref() == Some("none") {
        return Ok(false);
    }
    doc.set_style(id, "display", "none")?;
    Ok(true)
}

/// Insert a `<style id=..>` block unless one with that id exists.
pub(crate) fn inject_style(doc: &mut Document, id: &str, css: &str) -> PageResult<bool> {
    if doc.get_element_by_id(id).is_some() {
        return Ok(false);
    }
    let parent = style_parent(doc);
    let style = doc.create_element("style");
    doc.set_attr(style, "id", id)?;
    doc.set_text_content(style, css)?;
    doc.append_child(parent, style)?;
    Ok(true)
}
