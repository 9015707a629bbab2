//! Sharpen: an SVG convolution filter applied to images and videos.

use lightfps_page::{Document, NodeId, PageResult};

use super::{body_parent, elements};
use crate::markers::ElementTable;
use crate::report::{Step, StepReport};

/// Id of the hidden `<svg>` holding the filter definition.
pub const FILTER_ASSET_ID: &str = "sharpen-filter";
pub const FILTER_ID: &str = "sharpen";
pub const FILTER_CHAIN: &str = "contrast(1.1) saturate(1.1) url(#sharpen)";
pub const KERNEL: &str = "0 -1 0 -1 5 -1 0 -1 0";

/// Inject the filter once and point every unmarked image and video at it.
pub fn enable(doc: &mut Document, sharpened: &mut ElementTable<()>) -> StepReport {
    sharpened.sweep(doc);
    let mut report = StepReport::default();
    let anchor = body_parent(doc);
    report.record(Step::Sharpen, anchor, inject_filter(doc));

    for id in elements(doc, "img, video") {
        if sharpened.contains(id) {
            report.skipped += 1;
            continue;
        }
        let outcome = doc.set_style(id, "filter", FILTER_CHAIN).map(|()| true);
        if outcome.is_ok() {
            sharpened.insert(id, ());
        }
        report.record(Step::Sharpen, id, outcome);
    }
    report
}

/// Undo [`enable`]: clear the filters it set and drop the asset.
pub fn disable(doc: &mut Document, sharpened: &mut ElementTable<()>) -> StepReport {
    let mut report = StepReport::default();
    for (id, ()) in sharpened.drain() {
        if !doc.is_alive(id) {
            continue;
        }
        let outcome = doc.remove_style(id, "filter").map(|()| true);
        report.record(Step::Sharpen, id, outcome);
    }
    if let Some(asset) = doc.get_element_by_id(FILTER_ASSET_ID) {
        if doc.remove(asset) {
            report.applied += 1;
        }
    }
    report
}

fn inject_filter(doc: &mut Document) -> PageResult<bool> {
    if doc.get_element_by_id(FILTER_ASSET_ID).is_some() {
        return Ok(false);
    }
    let svg = doc.create_element("svg");
    doc.set_attr(svg, "id", FILTER_ASSET_ID)?;
    doc.set_style(svg, "display", "none")?;

    let filter = doc.create_element("filter");
    for (name, value) in [
        ("id", FILTER_ID),
        ("x", "-20%"),
        ("y", "-20%"),
        ("width", "140%"),
        ("height", "140%"),
    ] {
        doc.set_attr(filter, name, value)?;
    }

    let matrix = doc.create_element("feConvolveMatrix");
    doc.set_attr(matrix, "order", "3")?;
    doc.set_attr(matrix, "kernelMatrix", KERNEL)?;

    doc.append_child(filter, matrix)?;
    doc.append_child(svg, filter)?;
    let parent = body_parent(doc);
    doc.append_child(parent, svg)?;
    Ok(true)
}

/// The filter element inside the injected asset, if present.
pub fn filter_node(doc: &Document) -> Option<NodeId> {
    let asset = doc.get_element_by_id(FILTER_ASSET_ID)?;
    doc.children(asset)
        .iter()
        .copied()
        .find(|child| doc.attr(*child, "id") == Some(FILTER_ID))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfps_page::html::parse_html;

    const PAGE: &str = r#"<img id=a src="a.png"><video id=v></video><p id=p></p>"#;

    #[test]
    fn test_enable_is_idempotent() {
        let mut doc = parse_html(PAGE);
        let mut table = ElementTable::new();
        let first = enable(&mut doc, &mut table);
        assert_eq!(first.applied, 3);
        let second = enable(&mut doc, &mut table);
        assert_eq!((second.applied, second.skipped), (0, 3));

        assert_eq!(doc.query_selector_all("#sharpen-filter").unwrap().len(), 1);
        let img = doc.get_element_by_id("a").unwrap();
        assert_eq!(doc.style(img, "filter").as_deref(), Some(FILTER_CHAIN));
        let p = doc.get_element_by_id("p").unwrap();
        assert_eq!(doc.style(p, "filter"), None);
    }

    #[test]
    fn test_filter_definition() {
        let mut doc = parse_html(PAGE);
        enable(&mut doc, &mut ElementTable::new());
        let filter = filter_node(&doc).unwrap();
        assert_eq!(doc.attr(filter, "width"), Some("140%"));
        let matrix = doc.children(filter)[0];
        assert_eq!(doc.attr(matrix, "kernelMatrix"), Some(KERNEL));
        assert_eq!(doc.attr(matrix, "order"), Some("3"));
        let asset = doc.get_element_by_id(FILTER_ASSET_ID).unwrap();
        assert_eq!(doc.parent(asset), doc.body());
    }

    #[test]
    fn test_disable_reverts() {
        let mut doc = parse_html(PAGE);
        let mut table = ElementTable::new();
        enable(&mut doc, &mut table);
        disable(&mut doc, &mut table);
        assert!(table.is_empty());
        assert!(doc.get_element_by_id(FILTER_ASSET_ID).is_none());
        let video = doc.get_element_by_id("v").unwrap();
        assert_eq!(doc.style(video, "filter"), None);
    }

    #[test]
    fn test_new_elements_picked_up_on_rerun() {
        let mut doc = parse_html(PAGE);
        let mut table = ElementTable::new();
        enable(&mut doc, &mut table);
        let body = doc.body().unwrap();
        let late = doc.create_element("img");
        doc.append_child(body, late).unwrap();
        let report = enable(&mut doc, &mut table);
        assert_eq!(report.applied, 1);
        assert!(table.contains(late));
    }
}
