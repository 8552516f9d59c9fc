//! The boundary between the selection controller and a media player.
//!
//! The controller never talks to a player directly; it reads and writes the
//! handful of properties it needs through [`Player`].

mod memory;

pub use memory::{MemoryPlayer, PropertyWrite};

use parking_lot::Mutex;
use std::sync::Arc;

use tp_core::{AudioOption, RawTrack, Result, TrackChoice};

/// A track property the controller can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSlot {
    Audio,
    Sub,
    SecondarySub,
}

impl TrackSlot {
    /// The conventional player property name for this slot.
    pub fn property(&self) -> &'static str {
        match self {
            TrackSlot::Audio => "aid",
            TrackSlot::Sub => "sid",
            TrackSlot::SecondarySub => "secondary-sid",
        }
    }
}

/// A subtitle visibility property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilitySlot {
    Primary,
    Secondary,
}

impl VisibilitySlot {
    pub fn property(&self) -> &'static str {
        match self {
            VisibilitySlot::Primary => "sub-visibility",
            VisibilitySlot::Secondary => "secondary-sub-visibility",
        }
    }
}

/// Player properties used by the selection controller.
pub trait Player {
    /// The current track list, in player order.
    fn track_list(&self) -> Result<Vec<RawTrack>>;

    /// The audio-selection option (`auto`, `no`, or an id).
    fn audio_option(&self) -> Result<AudioOption>;

    /// The player's preferred audio languages, highest priority first.
    fn alang_priority(&self) -> Result<Vec<String>>;

    /// Whether the player's own automatic track selection is enabled.
    fn track_auto_selection(&self) -> Result<bool>;

    fn current_track(&self, slot: TrackSlot) -> Result<TrackChoice>;

    fn set_track(&mut self, slot: TrackSlot, choice: TrackChoice) -> Result<()>;

    fn sub_visibility(&self, slot: VisibilitySlot) -> Result<bool>;

    fn set_sub_visibility(&mut self, slot: VisibilitySlot, visible: bool) -> Result<()>;
}

/// A player shared with other owners, e.g. a test observing the service.
impl<P: Player> Player for Arc<Mutex<P>> {
    fn track_list(&self) -> Result<Vec<RawTrack>> {
        self.lock().track_list()
    }

    fn audio_option(&self) -> Result<AudioOption> {
        self.lock().audio_option()
    }

    fn alang_priority(&self) -> Result<Vec<String>> {
        self.lock().alang_priority()
    }

    fn track_auto_selection(&self) -> Result<bool> {
        self.lock().track_auto_selection()
    }

    fn current_track(&self, slot: TrackSlot) -> Result<TrackChoice> {
        self.lock().current_track(slot)
    }

    fn set_track(&mut self, slot: TrackSlot, choice: TrackChoice) -> Result<()> {
        self.lock().set_track(slot, choice)
    }

    fn sub_visibility(&self, slot: VisibilitySlot) -> Result<bool> {
        self.lock().sub_visibility(slot)
    }

    fn set_sub_visibility(&mut self, slot: VisibilitySlot, visible: bool) -> Result<()> {
        self.lock().set_sub_visibility(slot, visible)
    }
}
