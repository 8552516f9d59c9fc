use serde::Serialize;
use std::collections::HashMap;

use tp_core::{AudioOption, RawTrack, Result, TrackChoice};

use super::{Player, TrackSlot, VisibilitySlot};

/// One property write observed by a [`MemoryPlayer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyWrite {
    pub property: &'static str,
    pub value: String,
}

/// An in-memory player.
///
/// Every call to a setter is recorded, whether or not the value changed, so
/// callers can check how many writes a controller issued.
#[derive(Debug, Clone)]
pub struct MemoryPlayer {
    tracks: Vec<RawTrack>,
    audio_option: AudioOption,
    alang_priority: Vec<String>,
    track_auto_selection: bool,
    current: HashMap<TrackSlot, TrackChoice>,
    visibility: HashMap<VisibilitySlot, bool>,
    writes: Vec<PropertyWrite>,
}

impl Default for MemoryPlayer {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            audio_option: AudioOption::Auto,
            alang_priority: Vec::new(),
            track_auto_selection: true,
            current: HashMap::new(),
            visibility: HashMap::from([
                (VisibilitySlot::Primary, true),
                (VisibilitySlot::Secondary, true),
            ]),
            writes: Vec::new(),
        }
    }
}

impl MemoryPlayer {
    pub fn new(tracks: Vec<RawTrack>) -> Self {
        Self {
            tracks,
            ..Default::default()
        }
    }

    pub fn with_audio_option(mut self, option: AudioOption) -> Self {
        self.audio_option = option;
        self
    }

    pub fn with_alang_priority(mut self, langs: Vec<String>) -> Self {
        self.alang_priority = langs;
        self
    }

    pub fn with_track_auto_selection(mut self, enabled: bool) -> Self {
        self.track_auto_selection = enabled;
        self
    }

    pub fn tracks(&self) -> &[RawTrack] {
        &self.tracks
    }

    /// Replace the track list, as when external tracks are added mid-file.
    pub fn set_track_list(&mut self, tracks: Vec<RawTrack>) {
        self.tracks = tracks;
    }

    /// Begin playback: an unresolved audio slot takes the first
    /// default-flagged audio track, else the first audio track.
    pub fn start_playback(&mut self) {
        if !self.current_choice(TrackSlot::Audio).is_unset() {
            return;
        }

        let resolved = match self.audio_option {
            AudioOption::No => TrackChoice::Disabled,
            AudioOption::Track(id) => TrackChoice::Track(id),
            AudioOption::Auto => {
                let mut audio = self.tracks.iter().filter(|t| t.kind == "audio");
                let first_default = audio.clone().find(|t| t.default);
                first_default
                    .or_else(|| audio.next())
                    .and_then(|t| u32::try_from(t.id).ok())
                    .map_or(TrackChoice::Disabled, TrackChoice::Track)
            }
        };

        tracing::debug!("Player resolved audio to {}", resolved);
        self.current.insert(TrackSlot::Audio, resolved);
    }

    /// Change a track without recording a write, as a user would.
    pub fn switch_track(&mut self, slot: TrackSlot, choice: TrackChoice) {
        self.current.insert(slot, choice);
    }

    pub fn current_choice(&self, slot: TrackSlot) -> TrackChoice {
        self.current.get(&slot).copied().unwrap_or_default()
    }

    pub fn visible(&self, slot: VisibilitySlot) -> bool {
        self.visibility.get(&slot).copied().unwrap_or(true)
    }

    pub fn writes(&self) -> &[PropertyWrite] {
        &self.writes
    }
}

impl Player for MemoryPlayer {
    fn track_list(&self) -> Result<Vec<RawTrack>> {
        Ok(self.tracks.clone())
    }

    fn audio_option(&self) -> Result<AudioOption> {
        Ok(self.audio_option)
    }

    fn alang_priority(&self) -> Result<Vec<String>> {
        Ok(self.alang_priority.clone())
    }

    fn track_auto_selection(&self) -> Result<bool> {
        Ok(self.track_auto_selection)
    }

    fn current_track(&self, slot: TrackSlot) -> Result<TrackChoice> {
        Ok(self.current_choice(slot))
    }

    fn set_track(&mut self, slot: TrackSlot, choice: TrackChoice) -> Result<()> {
        self.writes.push(PropertyWrite {
            property: slot.property(),
            value: choice.to_string(),
        });
        self.current.insert(slot, choice);
        Ok(())
    }

    fn sub_visibility(&self, slot: VisibilitySlot) -> Result<bool> {
        Ok(self.visible(slot))
    }

    fn set_sub_visibility(&mut self, slot: VisibilitySlot, visible: bool) -> Result<()> {
        self.writes.push(PropertyWrite {
            property: slot.property(),
            value: if visible { "yes" } else { "no" }.to_string(),
        });
        self.visibility.insert(slot, visible);
        Ok(())
    }
}
