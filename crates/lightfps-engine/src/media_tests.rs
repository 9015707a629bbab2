use std::cell::RefCell;
use std::rc::Rc;

use lightfps_page::html::parse_html;
use lightfps_page::{PlayerQualityApi, Window};

use super::*;

const PAGE: &str = r#"
    <video id=plain src="a.mp4"></video>
    <video id=meta preload="metadata" src="b.mp4"></video>
    <video id=auto autoplay preload="AUTO" src="c.mp4"></video>
    <audio id=song autoplay src="d.mp3"></audio>
"#;

fn page() -> RunLoop {
    RunLoop::new(Window::new(parse_html(PAGE)))
}

fn by_id(rl: &RunLoop, id: &str) -> NodeId {
    rl.document().get_element_by_id(id).unwrap()
}

fn settings() -> Settings {
    Settings {
        auto_optimize: true,
        ..Settings::default()
    }
}

struct QualityRecorder(Rc<RefCell<Vec<String>>>);

impl PlayerQualityApi for QualityRecorder {
    fn set_playback_quality(&mut self, quality: &str) -> PageResult<()> {
        self.0.borrow_mut().push(quality.to_string());
        Ok(())
    }
}

#[test]
fn test_preload_and_controls() {
    let mut rl = page();
    let media = MediaController::new(MediaConfig::default());
    media.apply(&mut rl, &settings());

    let doc = rl.document();
    let plain = by_id(&rl, "plain");
    assert_eq!(doc.attr(plain, "preload"), Some("none"));
    assert!(doc.has_attr(plain, "controls"));
    assert!(doc.has_attr(plain, "disablePictureInPicture"));
    assert_eq!(doc.attr(by_id(&rl, "meta"), "preload"), Some("metadata"));
    assert_eq!(doc.attr(by_id(&rl, "auto"), "preload"), Some("AUTO"));
}

#[test]
fn test_second_apply_is_a_no_op() {
    let mut rl = page();
    let media = MediaController::new(MediaConfig::default());
    let all_on = Settings {
        disable_video_autoplay: true,
        disable_audio_autoplay: true,
        fps_smoother: true,
        ..settings()
    };
    media.apply(&mut rl, &all_on);
    let listeners = rl.listener_count();
    let again = media.apply(&mut rl, &all_on);
    assert_eq!(again.applied, 0);
    assert_eq!(rl.listener_count(), listeners);
}

#[test]
fn test_autoplay_suppressed_and_stopped() {
    let mut rl = page();
    rl.document_mut().finish_loading();
    rl.run_until_idle().unwrap();
    let video = by_id(&rl, "auto");
    let song = by_id(&rl, "song");
    assert!(is_playing(rl.document(), video));

    let media = MediaController::new(MediaConfig::default());
    media.apply(
        &mut rl,
        &Settings {
            disable_video_autoplay: true,
            ..settings()
        },
    );
    assert!(!rl.document().has_attr(video, "autoplay"));
    assert!(!is_playing(rl.document(), video));
    // audio is governed by its own flag
    assert!(rl.document().has_attr(song, "autoplay"));
    assert!(is_playing(rl.document(), song));
}

#[test]
fn test_audio_autoplay_flag() {
    let mut rl = page();
    let media = MediaController::new(MediaConfig::default());
    media.apply(
        &mut rl,
        &Settings {
            disable_audio_autoplay: true,
            ..settings()
        },
    );
    let song = by_id(&rl, "song");
    assert!(!rl.document().has_attr(song, "autoplay"));
    assert!(rl.document().has_attr(by_id(&rl, "auto"), "autoplay"));
}

#[test]
fn test_frame_sync_pins_rate_while_playing() {
    let mut rl = page();
    let video = by_id(&rl, "plain");
    let media = MediaController::new(MediaConfig::default());
    let smooth = Settings {
        fps_smoother: true,
        ..settings()
    };
    media.apply(&mut rl, &smooth);
    assert_eq!(media.frame_sync_count(), 3);
    assert!(!media.is_frame_syncing(video));

    rl.document_mut().play(video).unwrap();
    rl.run_until_idle().unwrap();
    assert!(media.is_frame_syncing(video));

    rl.document_mut().media_mut(video).unwrap().playback_rate = 2.0;
    rl.advance_ms(40).unwrap();
    assert_eq!(rl.document().media(video).unwrap().playback_rate, 1.0);

    rl.document_mut().pause(video).unwrap();
    rl.advance_ms(40).unwrap();
    assert!(!media.is_frame_syncing(video));
}

#[test]
fn test_frame_sync_torn_down_when_disabled() {
    let mut rl = page();
    let media = MediaController::new(MediaConfig::default());
    media.apply(
        &mut rl,
        &Settings {
            fps_smoother: true,
            ..settings()
        },
    );
    assert_eq!(rl.listener_count(), 3);
    media.apply(&mut rl, &settings());
    assert_eq!(media.frame_sync_count(), 0);
    assert_eq!(rl.listener_count(), 0);
}

#[test]
fn test_force_quality() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let window = Window::new(parse_html(PAGE)).with_player(QualityRecorder(calls.clone()));
    let mut rl = RunLoop::new(window);
    let plain = by_id(&rl, "plain");
    let meta = by_id(&rl, "meta");
    rl.document_mut().media_mut(plain).unwrap().quality = Some("auto".to_string());

    let media = MediaController::new(MediaConfig::default());
    media.apply(
        &mut rl,
        &Settings {
            force_quality: true,
            ..settings()
        },
    );
    assert_eq!(calls.borrow().first().map(String::as_str), Some("hd1080"));
    let doc = rl.document();
    assert_eq!(doc.media(plain).unwrap().quality.as_deref(), Some("high"));
    assert_eq!(doc.media(meta).unwrap().quality, None);
}

#[test]
fn test_visibility_listener_installed_once() {
    let mut rl = page();
    let media = MediaController::new(MediaConfig::default());
    assert!(media.install_visibility_listener(&mut rl).unwrap());
    assert!(!media.install_visibility_listener(&mut rl).unwrap());
    assert_eq!(
        rl.listener_count_for(EventTarget::Document, EventKind::VisibilityChange),
        1
    );
}

#[test]
fn test_hidden_page_pauses_and_resumes_the_same_videos() {
    let mut rl = page();
    let plain = by_id(&rl, "plain");
    let meta = by_id(&rl, "meta");
    let auto = by_id(&rl, "auto");
    let media = MediaController::new(MediaConfig::default());
    media.apply(&mut rl, &settings());
    media.install_visibility_listener(&mut rl).unwrap();

    rl.document_mut().play(plain).unwrap();
    rl.document_mut().play(meta).unwrap();
    rl.run_until_idle().unwrap();

    rl.window_mut().set_hidden(true);
    rl.run_until_idle().unwrap();
    for id in [plain, meta, auto] {
        assert!(!is_playing(rl.document(), id));
    }

    rl.window_mut().set_hidden(false);
    rl.run_until_idle().unwrap();
    assert!(is_playing(rl.document(), plain));
    assert!(is_playing(rl.document(), meta));
    assert!(!is_playing(rl.document(), auto));
}

#[test]
fn test_shown_page_stays_paused_when_autoplay_disabled() {
    let mut rl = page();
    let plain = by_id(&rl, "plain");
    let media = MediaController::new(MediaConfig::default());
    media.apply(
        &mut rl,
        &Settings {
            disable_video_autoplay: true,
            ..settings()
        },
    );
    media.install_visibility_listener(&mut rl).unwrap();
    rl.document_mut().play(plain).unwrap();

    rl.window_mut().set_hidden(true);
    rl.run_until_idle().unwrap();
    rl.window_mut().set_hidden(false);
    rl.run_until_idle().unwrap();
    assert!(!is_playing(rl.document(), plain));
}

#[test]
fn test_teardown_removes_listeners() {
    let mut rl = page();
    let media = MediaController::new(MediaConfig::default());
    media.apply(
        &mut rl,
        &Settings {
            fps_smoother: true,
            ..settings()
        },
    );
    media.install_visibility_listener(&mut rl).unwrap();
    media.teardown(&mut rl);
    assert_eq!(rl.listener_count(), 0);
    assert!(!media.has_visibility_listener());
}
