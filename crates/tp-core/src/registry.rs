//! The [`TrackRegistry`] normalizes a host track-list snapshot.

use std::collections::HashSet;

use crate::track::{RawTrack, Track, TrackType, UNDETERMINED_LANG};

/// Typed audio and subtitle sequences built from one track-list snapshot.
///
/// Host list order is preserved; it is the priority order used by the
/// matcher. The registry is never mutated after construction and is rebuilt
/// wholesale whenever the host reports a new track list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackRegistry {
    audio: Vec<Track>,
    subtitles: Vec<Track>,
}

impl TrackRegistry {
    /// Build a registry from raw host entries.
    ///
    /// Video and unknown track types are ignored. Entries with a non-positive
    /// id or an id already seen for the same type are dropped with a warning.
    pub fn from_raw(raw: impl IntoIterator<Item = RawTrack>) -> Self {
        let mut registry = Self::default();
        let mut seen: HashSet<(TrackType, u32)> = HashSet::new();

        for entry in raw {
            let kind = match entry.kind.as_str() {
                "audio" => TrackType::Audio,
                "sub" | "subtitle" => TrackType::Sub,
                _ => continue,
            };

            let id = match u32::try_from(entry.id) {
                Ok(id) if id > 0 => id,
                _ => {
                    tracing::warn!("Ignoring {} track with invalid id {}", kind, entry.id);
                    continue;
                }
            };

            if !seen.insert((kind, id)) {
                tracing::warn!("Ignoring duplicate {} track id {}", kind, id);
                continue;
            }

            let lang = entry
                .lang
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNDETERMINED_LANG.to_string());

            let track = Track {
                id,
                kind,
                lang,
                title: entry.title,
                default: entry.default,
                forced: entry.forced,
                codec: entry.codec,
                extra: entry.extra,
            };

            match kind {
                TrackType::Audio => registry.audio.push(track),
                _ => registry.subtitles.push(track),
            }
        }

        tracing::debug!(
            "Track registry built: {} audio, {} subtitle",
            registry.audio.len(),
            registry.subtitles.len()
        );
        registry
    }

    /// Build a registry from already-normalized tracks, keeping list order.
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut registry = Self::default();
        for track in tracks {
            match track.kind {
                TrackType::Audio => registry.audio.push(track),
                TrackType::Sub => registry.subtitles.push(track),
                TrackType::Video => {}
            }
        }
        registry
    }

    /// Parse a host track-list JSON array.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let raw: Vec<RawTrack> =
            serde_json::from_str(json).map_err(|e| crate::Error::config("<track-list>", e))?;
        Ok(Self::from_raw(raw))
    }

    pub fn audio(&self) -> &[Track] {
        &self.audio
    }

    pub fn subtitles(&self) -> &[Track] {
        &self.subtitles
    }

    pub fn audio_by_id(&self, id: u32) -> Option<&Track> {
        self.audio.iter().find(|t| t.id == id)
    }

    pub fn subtitle_by_id(&self, id: u32) -> Option<&Track> {
        self.subtitles.iter().find(|t| t.id == id)
    }

    /// Total number of audio and subtitle tracks.
    pub fn len(&self) -> usize {
        self.audio.len() + self.subtitles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.subtitles.is_empty()
    }
}
