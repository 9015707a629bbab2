use lightfps_page::html::parse_html;
use lightfps_page::Window;

use super::*;

fn page() -> RunLoop {
    let doc = parse_html(r#"<video id=v src="a.mp4"></video><div id=feed></div>"#);
    RunLoop::new(Window::new(doc))
}

fn video(rl: &RunLoop) -> NodeId {
    rl.document().get_element_by_id("v").unwrap()
}

fn manager() -> AudioGraphManager {
    AudioGraphManager::new(EqualizerConfig::default())
}

#[test]
fn test_flat_chain() {
    let mut rl = page();
    let audio = manager();
    let report = audio.apply(&mut rl, SoundPreset::Flat);
    assert_eq!(report.applied, 1);

    let graph = audio.graph(video(&rl)).unwrap();
    let host = rl.window().audio();
    let ctx = audio.context().unwrap();
    let chain = host.chain_from(graph.source);
    assert_eq!(chain.len(), 5);
    assert_eq!(&chain[1..4], &graph.filters);
    assert_eq!(chain[4], host.destination(ctx).unwrap());

    let low = host.biquad(graph.filters[0]).unwrap();
    assert_eq!(low.kind, BiquadKind::LowShelf);
    assert_eq!(low.frequency, 200.0);
    let mid = host.biquad(graph.filters[1]).unwrap();
    assert_eq!((mid.kind, mid.frequency, mid.q), (BiquadKind::Peaking, 1000.0, 1.0));
    let high = host.biquad(graph.filters[2]).unwrap();
    assert_eq!((high.kind, high.frequency), (BiquadKind::HighShelf, 3000.0));
}

#[test]
fn test_preset_change_rewires_same_source() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Flat);
    let before = audio.graph(video(&rl)).unwrap();

    let report = audio.apply(&mut rl, SoundPreset::Bass);
    assert_eq!(report.applied, 1);
    let after = audio.graph(video(&rl)).unwrap();
    assert_eq!(after.preset, SoundPreset::Bass);
    assert_eq!(after.source, before.source);

    let host = rl.window().audio();
    for old in before.filters {
        assert!(host.biquad(old).is_none());
        assert!(host.outputs(old).is_empty());
        assert!(!host.is_connected(before.source, old));
    }
    let gains: Vec<f64> = after
        .filters
        .iter()
        .map(|f| host.biquad(*f).unwrap().gain)
        .collect();
    assert_eq!(gains, vec![8.0, 0.0, -2.0]);
    assert_eq!(host.chain_from(after.source).len(), 5);
}

#[test]
fn test_same_preset_is_a_no_op() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Vocal);
    let graph = audio.graph(video(&rl));
    let listeners = rl.listener_count();

    let again = audio.apply(&mut rl, SoundPreset::Vocal);
    assert_eq!((again.applied, again.skipped), (0, 1));
    assert_eq!(audio.graph(video(&rl)), graph);
    assert_eq!(rl.listener_count(), listeners);
    assert_eq!(rl.observer_count(), 1);
}

#[test]
fn test_unsupported_host_disables_itself() {
    let doc = parse_html("<video></video>");
    let mut rl = RunLoop::new(Window::new(doc).with_audio(AudioHost::unsupported()));
    let audio = manager();
    let report = audio.apply(&mut rl, SoundPreset::Bass);
    assert_eq!(report.failed, 1);
    assert!(!audio.is_active());
    assert_eq!(rl.observer_count(), 0);
}

#[test]
fn test_late_media_is_equalized() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Treble);

    let feed = rl.document().get_element_by_id("feed").unwrap();
    let wrapper = rl.document_mut().create_element("div");
    let late = rl.document_mut().create_element("audio");
    rl.document_mut().append_child(wrapper, late).unwrap();
    rl.document_mut().append_child(feed, wrapper).unwrap();
    rl.run_until_idle().unwrap();

    let graph = audio.graph(late).unwrap();
    assert_eq!(graph.preset, SoundPreset::Treble);
    assert_eq!(audio.graph_count(), 2);
}

#[test]
fn test_play_resumes_suspended_context() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Flat);
    let ctx = audio.context().unwrap();
    assert_eq!(rl.window().audio().context_state(ctx), Some(ContextState::Suspended));

    let v = video(&rl);
    rl.document_mut().play(v).unwrap();
    rl.run_until_idle().unwrap();
    assert_eq!(rl.window().audio().context_state(ctx), Some(ContextState::Running));
}

#[test]
fn test_disable_is_idempotent() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Bass);
    let ctx = audio.context().unwrap();
    let graph = audio.graph(video(&rl)).unwrap();

    assert_eq!(audio.disable(&mut rl), 1);
    assert_eq!(audio.disable(&mut rl), 0);
    assert!(!audio.is_active());
    assert_eq!(rl.window().audio().context_state(ctx), Some(ContextState::Closed));
    assert!(rl.window().audio().outputs(graph.source).is_empty());
    assert_eq!(rl.listener_count(), 0);
    assert_eq!(rl.observer_count(), 0);
}

#[test]
fn test_captured_element_cannot_be_rewired_after_disable() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Bass);
    audio.disable(&mut rl);

    let report = audio.apply(&mut rl, SoundPreset::Bass);
    assert_eq!(report.failed, 1);
    assert_eq!(audio.graph_count(), 0);
    assert!(audio.context().is_some());
}

#[test]
fn test_removed_element_releases_graph() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Vocal);
    let v = video(&rl);
    let graph = audio.graph(v).unwrap();

    rl.document_mut().remove(v);
    rl.run_until_idle().unwrap();
    assert_eq!(audio.graph_count(), 0);
    assert!(rl.window().audio().biquad(graph.filters[1]).is_none());
}

#[test]
fn test_removed_element_releases_source() {
    let mut rl = page();
    let audio = manager();
    audio.apply(&mut rl, SoundPreset::Vocal);
    let v = video(&rl);
    let source = audio.graph(v).unwrap().source;

    rl.document_mut().remove(v);
    rl.run_until_idle().unwrap();
    let host = rl.window().audio();
    assert_eq!(host.source_for(v), None);
    assert!(host.bound_elements().is_empty());
    assert!(host.outputs(source).is_empty());
}
