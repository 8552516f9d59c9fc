//! Selection controller integration tests.
//!
//! Drives a [`SelectionController`] over a [`MemoryPlayer`] through file
//! load, playback start, audio switches, track-list changes and the
//! enable/disable command, checking the property writes it issues.

mod common;

use common::{controller, DUAL_AUDIO_TRACKS};
use tp_core::{AudioOption, Settings, TrackChoice};
use trackpick::controller::ToggleCommand;
use trackpick::player::{MemoryPlayer, PropertyWrite, TrackSlot, VisibilitySlot};

/// Japanese audio gets full English subs; English audio gets none.
const RULES: &str = r#"[
    {"alang": "jpn", "slang": "eng", "blacklist": "signs"},
    {"alang": "eng", "slang": "no"}
]"#;

fn write(property: &'static str, value: &str) -> PropertyWrite {
    PropertyWrite {
        property,
        value: value.to_string(),
    }
}

fn with_alang(player: &mut MemoryPlayer, langs: &[&str]) {
    let tracks = player.tracks().to_vec();
    *player = MemoryPlayer::new(tracks)
        .with_alang_priority(langs.iter().map(|l| l.to_string()).collect());
}

// ---------------------------------------------------------------------------
// Preload and prediction
// ---------------------------------------------------------------------------

#[test]
fn correct_prediction_needs_no_rerun() {
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, Settings::default());
    with_alang(c.player_mut(), &["jpn"]);

    let selection = c.on_file_loaded().unwrap().unwrap();
    assert_eq!(selection.rule_index, Some(0));

    c.player_mut().start_playback();
    assert!(c.on_playback_started().unwrap().is_none());
    assert_eq!(c.player().writes(), &[write("sid", "2")]);
}

#[test]
fn wrong_prediction_triggers_rerun() {
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, Settings::default());
    with_alang(c.player_mut(), &["eng"]);

    // Predicts English audio, so subtitles are disabled.
    let selection = c.on_file_loaded().unwrap().unwrap();
    assert_eq!(selection.rule_index, Some(1));

    // The player resolves to the default-flagged Japanese track instead.
    c.player_mut().start_playback();
    let rerun = c.on_playback_started().unwrap().unwrap();
    assert_eq!(rerun.rule_index, Some(0));

    assert_eq!(c.player().writes(), &[write("sid", "no"), write("sid", "2")]);
}

#[test]
fn wrong_prediction_ignored_when_detection_off() {
    let settings = Settings {
        detect_incorrect_predictions: false,
        ..Default::default()
    };
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, settings);
    with_alang(c.player_mut(), &["eng"]);

    c.on_file_loaded().unwrap();
    c.player_mut().start_playback();
    assert!(c.on_playback_started().unwrap().is_none());
    assert_eq!(
        c.player().current_choice(TrackSlot::Sub),
        TrackChoice::Disabled
    );
}

#[test]
fn same_selection_twice_writes_once() {
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, Settings::default());
    c.on_file_loaded().unwrap();
    c.on_file_loaded().unwrap();
    c.player_mut().start_playback();
    c.reselect().unwrap();
    assert_eq!(c.player().writes().len(), 1);
}

// ---------------------------------------------------------------------------
// Selection after playback starts
// ---------------------------------------------------------------------------

#[test]
fn without_preload_selection_waits_for_playback() {
    let settings = Settings {
        preload: false,
        ..Default::default()
    };
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, settings);

    assert!(c.on_file_loaded().unwrap().is_none());
    assert!(c.player().writes().is_empty());

    c.player_mut().start_playback();
    let selection = c.on_playback_started().unwrap().unwrap();
    assert_eq!(selection.audio, TrackChoice::Track(1));
    assert_eq!(c.player().writes(), &[write("sid", "2")]);
}

#[test]
fn audio_switch_reselects_when_observed() {
    let settings = Settings {
        observe_audio_switches: true,
        ..Default::default()
    };
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, settings);
    c.on_file_loaded().unwrap();
    c.player_mut().start_playback();
    c.on_playback_started().unwrap();

    // Nothing changed yet.
    assert!(c.on_audio_changed().unwrap().is_none());

    c.player_mut()
        .switch_track(TrackSlot::Audio, TrackChoice::Track(2));
    let selection = c.on_audio_changed().unwrap().unwrap();
    assert_eq!(selection.rule_index, Some(1));
    assert_eq!(
        c.player().current_choice(TrackSlot::Sub),
        TrackChoice::Disabled
    );
}

#[test]
fn audio_switch_ignored_by_default() {
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, Settings::default());
    c.on_file_loaded().unwrap();
    c.player_mut().start_playback();
    c.on_playback_started().unwrap();

    c.player_mut()
        .switch_track(TrackSlot::Audio, TrackChoice::Track(2));
    assert!(c.on_audio_changed().unwrap().is_none());
}

#[test]
fn track_count_change_reselects_after_start() {
    let mut c = controller(
        r#"[{"slang": "ger"}, {"slang": "eng", "blacklist": "signs"}]"#,
        DUAL_AUDIO_TRACKS,
        Settings::default(),
    );
    c.on_file_loaded().unwrap();
    c.player_mut().start_playback();
    c.on_playback_started().unwrap();
    assert_eq!(c.player().current_choice(TrackSlot::Sub), TrackChoice::Track(2));

    let mut tracks = c.player().tracks().to_vec();
    tracks.push(
        serde_json::from_str(r#"{"id": 4, "type": "sub", "lang": "ger", "external": true}"#)
            .unwrap(),
    );
    c.player_mut().set_track_list(tracks);

    let selection = c.on_track_list_changed().unwrap().unwrap();
    assert_eq!(selection.rule_index, Some(0));
    assert_eq!(c.player().current_choice(TrackSlot::Sub), TrackChoice::Track(4));

    // Same count again: nothing to do.
    assert!(c.on_track_list_changed().unwrap().is_none());
}

/// A rule for the "no audio" candidate ahead of a catch-all.
const NO_AUDIO_FIRST: &str = r#"[
    {"alang": "no", "slang": "no"},
    {"slang": "eng"}
]"#;

fn async_settings() -> Settings {
    Settings {
        preload: false,
        ..Default::default()
    }
}

#[test]
fn reselect_before_playback_predicts_unresolved_audio() {
    let mut c = controller(NO_AUDIO_FIRST, DUAL_AUDIO_TRACKS, async_settings());
    assert!(c.on_file_loaded().unwrap().is_none());
    assert_eq!(c.player().current_choice(TrackSlot::Audio), TrackChoice::Unset);

    // Unresolved audio is not "no audio": the default Japanese track is used.
    let selection = c.reselect().unwrap().unwrap();
    assert_eq!(selection.rule_index, Some(1));
    assert_eq!(selection.sub, TrackChoice::Track(1));
    assert_eq!(c.player().writes(), &[write("sid", "1")]);
}

#[test]
fn enabling_before_playback_predicts_unresolved_audio() {
    let mut c = controller(NO_AUDIO_FIRST, DUAL_AUDIO_TRACKS, async_settings());
    c.on_file_loaded().unwrap();
    c.set_enabled(ToggleCommand::Disable).unwrap();

    let selection = c.set_enabled(ToggleCommand::Enable).unwrap().unwrap();
    assert_eq!(selection.rule_index, Some(1));
    assert_ne!(
        c.player().current_choice(TrackSlot::Sub),
        TrackChoice::Disabled
    );
}

#[test]
fn reselect_with_audio_disabled_uses_no_audio_rule() {
    let mut c = controller(NO_AUDIO_FIRST, DUAL_AUDIO_TRACKS, async_settings());
    let tracks = c.player().tracks().to_vec();
    *c.player_mut() = MemoryPlayer::new(tracks).with_audio_option(AudioOption::No);

    // Before playback the predictor honours `aid=no`.
    c.on_file_loaded().unwrap();
    assert_eq!(c.reselect().unwrap().unwrap().rule_index, Some(0));

    // After playback the player reports audio as disabled.
    c.player_mut().start_playback();
    assert_eq!(
        c.player().current_choice(TrackSlot::Audio),
        TrackChoice::Disabled
    );
    assert_eq!(c.reselect().unwrap().unwrap().rule_index, Some(0));
    assert_eq!(c.player().writes(), &[write("sid", "no")]);
}

// ---------------------------------------------------------------------------
// Audio selection and visibility
// ---------------------------------------------------------------------------

#[test]
fn select_audio_writes_audio_and_visibility() {
    let settings = Settings {
        select_audio: true,
        ..Default::default()
    };
    let mut c = controller(
        r#"[{"alang": "eng", "slang": "forced", "sub_visibility": false,
             "secondary_slang": "jpn", "secondary_sub_visibility": true}]"#,
        DUAL_AUDIO_TRACKS,
        settings,
    );

    let selection = c.on_file_loaded().unwrap().unwrap();
    assert_eq!(selection.audio, TrackChoice::Track(2));

    // Secondary visibility already matches, so it is not written.
    assert_eq!(
        c.player().writes(),
        &[
            write("aid", "2"),
            write("sid", "1"),
            write("secondary-sid", "3"),
            write("sub-visibility", "no"),
        ]
    );
    assert!(!c.player().visible(VisibilitySlot::Primary));

    // The player keeps the written audio track when playback starts.
    c.player_mut().start_playback();
    assert!(c.on_playback_started().unwrap().is_none());
    assert_eq!(c.player().writes().len(), 4);
}

// ---------------------------------------------------------------------------
// Enable / disable
// ---------------------------------------------------------------------------

#[test]
fn disabling_preserves_tracks_and_enabling_reselects() {
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, Settings::default());
    c.on_file_loaded().unwrap();
    c.player_mut().start_playback();
    c.on_playback_started().unwrap();

    assert!(c.set_enabled(ToggleCommand::Toggle).unwrap().is_none());
    assert!(!c.is_enabled());
    assert_eq!(c.player().current_choice(TrackSlot::Sub), TrackChoice::Track(2));

    // While disabled, nothing runs.
    c.player_mut().switch_track(TrackSlot::Sub, TrackChoice::Track(3));
    assert!(c.reselect().unwrap().is_none());
    assert_eq!(c.player().current_choice(TrackSlot::Sub), TrackChoice::Track(3));

    let selection = c.set_enabled(ToggleCommand::Enable).unwrap();
    assert!(selection.is_some());
    assert_eq!(c.player().current_choice(TrackSlot::Sub), TrackChoice::Track(2));

    // Enabling an enabled engine does nothing.
    assert!(c.set_enabled(ToggleCommand::Enable).unwrap().is_none());
}

#[test]
fn host_auto_selection_off_blocks_runs() {
    let mut c = controller(RULES, DUAL_AUDIO_TRACKS, Settings::default());
    let tracks = c.player().tracks().to_vec();
    *c.player_mut() = MemoryPlayer::new(tracks).with_track_auto_selection(false);

    assert!(c.on_file_loaded().unwrap().is_none());
    c.player_mut().start_playback();
    assert!(c.on_playback_started().unwrap().is_none());
    assert!(c.reselect().unwrap().is_none());
    assert!(c.player().writes().is_empty());
}
