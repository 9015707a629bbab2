use super::*;
use crate::style::Color;

fn skeleton() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let html = doc.create_element("html");
    let head = doc.create_element("head");
    let body = doc.create_element("body");
    doc.append_child(doc.root(), html).unwrap();
    doc.append_child(html, head).unwrap();
    doc.append_child(html, body).unwrap();
    doc.take_mutations();
    (doc, head, body)
}

#[test]
fn test_new_document_is_loading() {
    let doc = Document::new();
    assert_eq!(doc.ready_state(), ReadyState::Loading);
    assert!(doc.is_empty());
    assert!(doc.body().is_none());
}

#[test]
fn test_head_and_body() {
    let (doc, head, body) = skeleton();
    assert_eq!(doc.head(), Some(head));
    assert_eq!(doc.body(), Some(body));
    assert!(doc.is_connected(body));
}

#[test]
fn test_append_records_mutation() {
    let (mut doc, _, body) = skeleton();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    let records = doc.take_mutations();
    assert_eq!(records, vec![MutationRecord::added(body, div)]);
    assert!(doc.take_mutations().is_empty());
}

#[test]
fn test_move_records_removal_then_addition() {
    let (mut doc, head, body) = skeleton();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    doc.take_mutations();
    doc.append_child(head, div).unwrap();
    let records = doc.take_mutations();
    assert_eq!(
        records,
        vec![
            MutationRecord::removed(body, div),
            MutationRecord::added(head, div)
        ]
    );
    assert!(doc.children(body).is_empty());
}

#[test]
fn test_append_rejects_cycles_and_text_parents() {
    let (mut doc, _, body) = skeleton();
    let html = doc.document_element().unwrap();
    assert!(matches!(
        doc.append_child(body, html),
        Err(PageError::Hierarchy(_))
    ));
    let text = doc.create_text("hi");
    let div = doc.create_element("div");
    assert!(matches!(
        doc.append_child(text, div),
        Err(PageError::Hierarchy(_))
    ));
}

#[test]
fn test_remove_frees_subtree_and_invalidates_handles() {
    let (mut doc, _, body) = skeleton();
    let div = doc.create_element("div");
    let span = doc.create_element("span");
    doc.append_child(body, div).unwrap();
    doc.append_child(div, span).unwrap();
    doc.take_mutations();

    assert!(doc.remove(div));
    assert!(!doc.is_alive(div));
    assert!(!doc.is_alive(span));
    assert!(!doc.remove(div));
    assert_eq!(doc.take_mutations(), vec![MutationRecord::removed(body, div)]);

    // Slot reuse must not revive the stale handle.
    let fresh = doc.create_element("p");
    assert!(doc.is_alive(fresh));
    assert!(!doc.is_alive(div));
    assert!(!doc.is_alive(span));
}

#[test]
fn test_root_cannot_be_removed() {
    let mut doc = Document::new();
    let root = doc.root();
    assert!(!doc.remove(root));
}

#[test]
fn test_inline_style_edit() {
    let (mut doc, _, body) = skeleton();
    doc.set_attr(body, "style", "color: red; margin: 0").unwrap();
    doc.set_style(body, "display", "none").unwrap();
    doc.set_style(body, "color", "blue").unwrap();
    assert_eq!(doc.style(body, "display").as_deref(), Some("none"));
    assert_eq!(doc.style(body, "color").as_deref(), Some("blue"));

    doc.remove_style(body, "display").unwrap();
    assert!(doc.style(body, "display").is_none());
    doc.remove_style(body, "color").unwrap();
    doc.remove_style(body, "margin").unwrap();
    assert!(!doc.has_attr(body, "style"));
}

#[test]
fn test_attr_on_text_node_fails() {
    let mut doc = Document::new();
    let text = doc.create_text("x");
    assert!(matches!(
        doc.set_attr(text, "id", "a"),
        Err(PageError::NotAnElement(_))
    ));
}

#[test]
fn test_text_content_and_set() {
    let (mut doc, head, _) = skeleton();
    let style = doc.create_element("style");
    doc.append_child(head, style).unwrap();
    doc.set_text_content(style, "a { color: red }").unwrap();
    assert_eq!(doc.text_content(style), "a { color: red }");
    doc.set_text_content(style, "b {}").unwrap();
    assert_eq!(doc.children(style).len(), 1);
    assert_eq!(doc.text_content(style), "b {}");
}

#[test]
fn test_query_selector_all_in_document_order() {
    let (mut doc, _, body) = skeleton();
    let a = doc.create_element("video");
    let wrap = doc.create_element("div");
    let b = doc.create_element("video");
    doc.append_child(body, a).unwrap();
    doc.append_child(body, wrap).unwrap();
    doc.append_child(wrap, b).unwrap();
    assert_eq!(doc.query_selector_all("video").unwrap(), vec![a, b]);
    assert_eq!(doc.query_selector_all_in(wrap, "video").unwrap(), vec![b]);
    assert_eq!(doc.query_selector("div video").unwrap(), Some(b));
}

#[test]
fn test_get_element_by_id() {
    let (mut doc, _, body) = skeleton();
    let div = doc.create_element("div");
    doc.set_attr(div, "id", "chat").unwrap();
    doc.append_child(body, div).unwrap();
    assert_eq!(doc.get_element_by_id("chat"), Some(div));
    assert_eq!(doc.get_element_by_id("nope"), None);
}

#[test]
fn test_play_pause_queue_events_once() {
    let (mut doc, _, body) = skeleton();
    let video = doc.create_element("video");
    doc.append_child(body, video).unwrap();

    doc.play(video).unwrap();
    doc.play(video).unwrap();
    doc.pause(video).unwrap();
    doc.pause(video).unwrap();

    let target = EventTarget::Element(video);
    assert_eq!(doc.pop_event(), Some(PageEvent::new(target, EventKind::Play)));
    assert_eq!(doc.pop_event(), Some(PageEvent::new(target, EventKind::Pause)));
    assert_eq!(doc.pop_event(), None);
}

#[test]
fn test_finish_playback() {
    let (mut doc, _, body) = skeleton();
    let video = doc.create_element("video");
    doc.append_child(body, video).unwrap();
    doc.play(video).unwrap();
    doc.pop_event();

    doc.finish_playback(video).unwrap();
    let state = doc.media(video).unwrap();
    assert!(state.ended);
    assert!(!state.is_playing());
    assert_eq!(doc.pop_event().map(|e| e.kind), Some(EventKind::Pause));
    assert_eq!(doc.pop_event().map(|e| e.kind), Some(EventKind::Ended));
}

#[test]
fn test_play_non_media_fails() {
    let (mut doc, _, body) = skeleton();
    assert!(matches!(doc.play(body), Err(PageError::NotMedia(_))));
}

#[test]
fn test_finish_loading_starts_autoplay_and_queues_dcl() {
    let (mut doc, _, body) = skeleton();
    let auto = doc.create_element("video");
    doc.set_attr(auto, "autoplay", "").unwrap();
    let manual = doc.create_element("video");
    doc.append_child(body, auto).unwrap();
    doc.append_child(body, manual).unwrap();

    doc.finish_loading();
    assert_eq!(doc.ready_state(), ReadyState::Interactive);
    assert!(doc.media(auto).unwrap().is_playing());
    assert!(!doc.media(manual).unwrap().is_playing());
    assert_eq!(doc.pop_event().map(|e| e.kind), Some(EventKind::Play));
    assert_eq!(
        doc.pop_event(),
        Some(PageEvent::new(EventTarget::Document, EventKind::DomContentLoaded))
    );

    doc.finish_loading();
    assert!(doc.pop_event().is_none());
}

#[test]
fn test_computed_style_cascade() {
    let (mut doc, head, body) = skeleton();
    let style = doc.create_element("style");
    doc.append_child(head, style).unwrap();
    doc.set_text_content(
        style,
        "body { color: #333 } .card { background: #fff; border: 1px solid #eee } .card { background-color: #fafafa }",
    )
    .unwrap();
    let card = doc.create_element("div");
    doc.set_attr(card, "class", "card").unwrap();
    doc.append_child(body, card).unwrap();

    let computed = doc.computed_style(card).unwrap();
    assert_eq!(computed.background_color, Color::rgb(250, 250, 250));
    assert_eq!(computed.color, Color::rgb(51, 51, 51));
    assert_eq!(computed.border_color, Color::rgb(238, 238, 238));

    doc.set_style(card, "background-color", "black").unwrap();
    let computed = doc.computed_style(card).unwrap();
    assert_eq!(computed.background_color, Color::BLACK);
}

#[test]
fn test_computed_style_defaults() {
    let (doc, _, body) = skeleton();
    let computed = doc.computed_style(body).unwrap();
    assert_eq!(computed.background_color, Color::TRANSPARENT);
    assert_eq!(computed.color, Color::BLACK);
    assert_eq!(computed.border_color, Color::BLACK);
}

#[test]
fn test_computed_style_of_removed_node() {
    let (mut doc, _, body) = skeleton();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    doc.remove(div);
    assert!(matches!(
        doc.computed_style(div),
        Err(PageError::StyleUnavailable(_))
    ));
}
