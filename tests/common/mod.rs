//! Shared fixtures for integration tests.
//!
//! Provides a realistic track list for a dual-audio release and helpers to
//! build an engine or a [`SelectionController`] over a [`MemoryPlayer`].

#![allow(dead_code)]

use tp_core::{RawTrack, Settings, Track, TrackRegistry};
use tp_rules::{parse_rules, MatchOptions, SelectionEngine};
use trackpick::controller::SelectionController;
use trackpick::player::MemoryPlayer;

/// Host track list for a dual-audio anime episode.
pub const DUAL_AUDIO_TRACKS: &str = r#"[
    {"id": 1, "type": "video", "codec": "hevc"},
    {"id": 1, "type": "audio", "lang": "jpn", "default": true, "codec": "flac"},
    {"id": 2, "type": "audio", "lang": "eng", "codec": "aac"},
    {"id": 1, "type": "sub", "lang": "eng", "title": "Signs & Songs", "forced": true},
    {"id": 2, "type": "sub", "lang": "eng", "title": "Full Subtitles", "default": true},
    {"id": 3, "type": "sub", "lang": "jpn", "title": "Japanese"}
]"#;

pub fn raw_tracks(json: &str) -> Vec<RawTrack> {
    serde_json::from_str(json).expect("valid track list")
}

pub fn registry(tracks: Vec<Track>) -> TrackRegistry {
    TrackRegistry::from_tracks(tracks)
}

pub fn engine(rules: &str) -> SelectionEngine {
    SelectionEngine::new(parse_rules(rules).expect("valid rules"), MatchOptions::default())
}

pub fn engine_with(rules: &str, options: MatchOptions) -> SelectionEngine {
    SelectionEngine::new(parse_rules(rules).expect("valid rules"), options)
}

/// A controller over a fresh [`MemoryPlayer`] holding `tracks`.
pub fn controller(
    rules: &str,
    tracks: &str,
    settings: Settings,
) -> SelectionController<MemoryPlayer> {
    let player = MemoryPlayer::new(raw_tracks(tracks));
    SelectionController::new(player, settings, engine(rules))
}
