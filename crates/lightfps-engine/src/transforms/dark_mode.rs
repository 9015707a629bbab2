//! Dark mode: darken light surfaces through inline styles.
//!
//! Elements are visited in document order starting at the root element.
//! A property is only written when the resolved colour is light and the
//! page has not set that property inline itself. Because the stylesheet is
//! re-resolved against the live inline styles, children see the colours
//! their ancestors were just given.

use lightfps_config::DarkModeConfig;
use lightfps_page::{Color, Document, NodeId, PageResult, Stylesheet};

use crate::report::{Step, StepReport};

pub fn apply(doc: &mut Document, config: &DarkModeConfig) -> StepReport {
    let mut report = StepReport::default();
    let Some(root) = doc.document_element() else {
        return report;
    };
    let sheet = doc.stylesheet();

    let mut walk = vec![root];
    walk.extend(doc.descendants(root));
    for id in walk {
        if doc.element(id).is_none() {
            continue;
        }
        let outcome = darken(doc, &sheet, id, config);
        report.record(Step::DarkMode, id, outcome);
    }

    let body = doc.body();
    let fallbacks = [
        (Some(root), "background-color", &config.background),
        (body, "background-color", &config.background),
        (body, "color", &config.text),
    ];
    for (target, prop, value) in fallbacks {
        let Some(target) = target else { continue };
        let outcome = fill_unset(doc, target, prop, value);
        report.record(Step::DarkMode, target, outcome);
    }
    report
}

fn darken(
    doc: &mut Document,
    sheet: &Stylesheet,
    id: NodeId,
    config: &DarkModeConfig,
) -> PageResult<bool> {
    let computed = sheet.computed(doc, id)?;
    let candidates = [
        ("background-color", "background", computed.background_color, &config.background),
        ("color", "color", computed.color, &config.text),
        ("border-color", "border", computed.border_color, &config.border),
    ];
    let mut changed = false;
    for (prop, shorthand, color, value) in candidates {
        // An undeclared border is currentColor and changes with the text.
        if prop == "border-color" && computed.border_follows_text {
            continue;
        }
        if !is_light(color, config.threshold)
            || Color::parse(value) == Some(color)
            || has_inline(doc, id, prop, shorthand)
        {
            continue;
        }
        doc.set_style(id, prop, value)?;
        changed = true;
    }
    Ok(changed)
}

fn fill_unset(doc: &mut Document, id: NodeId, prop: &str, value: &str) -> PageResult<bool> {
    let shorthand = if prop == "background-color" { "background" } else { prop };
    if has_inline(doc, id, prop, shorthand) {
        return Ok(false);
    }
    doc.set_style(id, prop, value)?;
    Ok(true)
}

fn is_light(color: Color, threshold: f64) -> bool {
    color.luminance() > threshold
}

fn has_inline(doc: &Document, id: NodeId, prop: &str, shorthand: &str) -> bool {
    doc.style(id, prop).is_some() || doc.style(id, shorthand).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfps_page::html::parse_html;

    const PAGE: &str = r#"<html><head><style>
        .card { background-color: rgb(255, 255, 255); border: 1px solid #eeeeee }
        .muted { color: #333333 }
    </style></head><body>
        <div class="card" id="card"><p id="inner">hi</p></div>
        <div class="card" id="owned" style="background-color: #fafafa">own</div>
        <div class="muted" id="muted">dark text</div>
    </body></html>"#;

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_light_backgrounds_get_darkened() {
        let mut doc = parse_html(PAGE);
        apply(&mut doc, &DarkModeConfig::default());
        let card = by_id(&doc, "card");
        assert_eq!(doc.style(card, "background-color").as_deref(), Some("#181818"));
        assert_eq!(doc.style(card, "border-color").as_deref(), Some("#444"));
    }

    #[test]
    fn test_inline_page_values_are_kept() {
        let mut doc = parse_html(PAGE);
        apply(&mut doc, &DarkModeConfig::default());
        let owned = by_id(&doc, "owned");
        assert_eq!(doc.style(owned, "background-color").as_deref(), Some("#fafafa"));
    }

    #[test]
    fn test_dark_colours_are_left_alone() {
        let mut doc = parse_html(PAGE);
        apply(&mut doc, &DarkModeConfig::default());
        let muted = by_id(&doc, "muted");
        assert_eq!(doc.style(muted, "color"), None);
        let inner = by_id(&doc, "inner");
        assert_eq!(doc.style(inner, "background-color"), None);
    }

    #[test]
    fn test_root_and_body_fallbacks() {
        let mut doc = parse_html("<p>plain</p>");
        apply(&mut doc, &DarkModeConfig::default());
        let html = doc.document_element().unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.style(html, "background-color").as_deref(), Some("#181818"));
        assert_eq!(doc.style(body, "background-color").as_deref(), Some("#181818"));
        assert_eq!(doc.style(body, "color").as_deref(), Some("#ccc"));
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let mut doc = parse_html(PAGE);
        apply(&mut doc, &DarkModeConfig::default());
        let before = lightfps_page::html::serialize(&doc);
        let again = apply(&mut doc, &DarkModeConfig::default());
        assert_eq!(again.applied, 0);
        assert_eq!(lightfps_page::html::serialize(&doc), before);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let page = r#"<style>.grey { background-color: #999999 }</style><div class="grey" id="grey">x</div>"#;
        let mut doc = parse_html(page);
        apply(&mut doc, &DarkModeConfig::default());
        let grey = by_id(&doc, "grey");
        assert_eq!(doc.style(grey, "background-color"), None);

        let config = DarkModeConfig {
            threshold: 100.0,
            ..DarkModeConfig::default()
        };
        apply(&mut doc, &config);
        assert_eq!(doc.style(grey, "background-color").as_deref(), Some("#181818"));
    }

    #[test]
    fn test_declared_border_matching_text_is_darkened() {
        let page = r#"<style>.x{background-color:#000;color:#ffffff;border:1px solid #ffffff}</style>
            <div class="x" id="x">x</div>"#;
        let mut doc = parse_html(page);
        apply(&mut doc, &DarkModeConfig::default());
        let x = by_id(&doc, "x");
        assert_eq!(doc.style(x, "border-color").as_deref(), Some("#444"));
        assert_eq!(doc.style(x, "color").as_deref(), Some("#ccc"));
        assert_eq!(doc.style(x, "background-color"), None);

        let again = apply(&mut doc, &DarkModeConfig::default());
        assert_eq!(again.applied, 0);
    }

    #[test]
    fn test_more_specific_light_rule_is_darkened() {
        let page = r#"<style>#main{background-color:#ffffff} div{background-color:#222222}</style>
            <div id="main">x</div>"#;
        let mut doc = parse_html(page);
        apply(&mut doc, &DarkModeConfig::default());
        let main = by_id(&doc, "main");
        assert_eq!(doc.style(main, "background-color").as_deref(), Some("#181818"));
    }

    #[test]
    fn test_own_text_colour_is_not_light_again() {
        let mut doc = parse_html("<div><p id=p>text</p></div>");
        apply(&mut doc, &DarkModeConfig::default());
        // body now carries the fallback text colour; descendants inherit it
        let again = apply(&mut doc, &DarkModeConfig::default());
        assert_eq!(again.applied, 0);
        let p = by_id(&doc, "p");
        assert_eq!(doc.style(p, "color"), None);
        assert_eq!(doc.style(p, "border-color"), None);
    }
}
