//! `loading="lazy"` on images and videos that do not say otherwise.

use lightfps_page::{Document, NodeId, PageResult};

use super::elements;
use crate::report::{Step, StepReport};

pub fn apply(doc: &mut Document) -> StepReport {
    let mut report = StepReport::default();
    for id in elements(doc, "img, video") {
        let outcome = tag(doc, id);
        report.record(Step::LazyLoad, id, outcome);
    }
    report
}

fn tag(doc: &mut Document, id: NodeId) -> PageResult<bool> {
    if doc.has_attr(id, "loading") {
        return Ok(false);
    }
    doc.set_attr(id, "loading", "lazy")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfps_page::html::parse_html;

    #[test]
    fn test_tags_untagged_media_only() {
        let mut doc = parse_html(
            r#"<img id=a src="a.png"><img id=b loading="eager" src="b.png"><video id=v></video><iframe id=f></iframe>"#,
        );
        let report = apply(&mut doc);
        assert_eq!((report.applied, report.skipped), (2, 1));

        let by_id = |id| doc.get_element_by_id(id).unwrap();
        assert_eq!(doc.attr(by_id("a"), "loading"), Some("lazy"));
        assert_eq!(doc.attr(by_id("b"), "loading"), Some("eager"));
        assert_eq!(doc.attr(by_id("v"), "loading"), Some("lazy"));
        assert_eq!(doc.attr(by_id("f"), "loading"), None);
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let mut doc = parse_html(r#"<img src="a.png">"#);
        apply(&mut doc);
        let again = apply(&mut doc);
        assert_eq!((again.applied, again.skipped), (0, 1));
    }
}
