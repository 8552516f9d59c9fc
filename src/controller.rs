//! Drives the selection engine from player events.
//!
//! The controller owns all mutable session state. A session starts on every
//! file load; only the enabled flag carries over between files.

use std::fmt;
use std::str::FromStr;

use tp_core::{Error, Result, Settings, TrackChoice, TrackRegistry};
use tp_rules::{predict_audio, AudioCandidates, Selection, SelectionEngine};

use crate::player::{Player, TrackSlot, VisibilitySlot};

/// The `enable|disable|toggle` control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleCommand {
    Enable,
    Disable,
    Toggle,
}

impl FromStr for ToggleCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "enable" => Ok(ToggleCommand::Enable),
            "disable" => Ok(ToggleCommand::Disable),
            "toggle" => Ok(ToggleCommand::Toggle),
            other => Err(Error::Validation(format!(
                "unknown command '{other}' (expected enable, disable or toggle)"
            ))),
        }
    }
}

impl fmt::Display for ToggleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToggleCommand::Enable => "enable",
            ToggleCommand::Disable => "disable",
            ToggleCommand::Toggle => "toggle",
        })
    }
}

/// State for the file currently loaded.
#[derive(Debug, Default)]
struct Session {
    registry: TrackRegistry,
    /// Audio predicted in preload mode, if a prediction was made.
    predicted_audio: Option<TrackChoice>,
    /// Audio most recently applied by us or observed on the player.
    last_audio: TrackChoice,
    playback_started: bool,
}

pub struct SelectionController<P> {
    player: P,
    settings: Settings,
    engine: SelectionEngine,
    enabled: bool,
    session: Session,
}

impl<P: Player> SelectionController<P> {
    pub fn new(player: P, settings: Settings, engine: SelectionEngine) -> Self {
        Self {
            player,
            settings,
            engine,
            enabled: true,
            session: Session::default(),
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.session.registry
    }

    pub fn into_player(self) -> P {
        self.player
    }

    /// A new file was loaded. In preload mode, select before playback starts.
    pub fn on_file_loaded(&mut self) -> Result<Option<Selection>> {
        self.session = Session::default();
        self.refresh_registry()?;

        if !self.settings.preload {
            tracing::debug!("Preload disabled; waiting for playback to start");
            return Ok(None);
        }

        if !self.should_run()? {
            return Ok(None);
        }

        let selection = if self.settings.chooses_audio() {
            self.select_and_apply(AudioCandidates::All)?
        } else {
            let option = self.player.audio_option()?;
            let priority = self.player.alang_priority()?;
            let registry = &self.session.registry;
            let predicted = predict_audio(registry.audio(), option, &priority);
            let predicted_choice = TrackChoice::from(predicted);
            let selection = self.engine.select(registry, AudioCandidates::Only(predicted));

            self.session.predicted_audio = Some(predicted_choice);
            self.session.last_audio = predicted_choice;
            self.apply(&selection)?;
            selection
        };

        Ok(Some(selection))
    }

    /// Playback started: the player has resolved its own audio track.
    pub fn on_playback_started(&mut self) -> Result<Option<Selection>> {
        self.session.playback_started = true;

        if !self.settings.preload {
            self.refresh_registry()?;
            if !self.should_run()? {
                return Ok(None);
            }
            if self.settings.select_audio {
                return self.select_and_apply(AudioCandidates::All).map(Some);
            }
            return self.run_with_current_audio();
        }

        let current = self.player.current_track(TrackSlot::Audio)?;
        let predicted = self.session.predicted_audio;
        if predicted.is_none() {
            self.session.last_audio = current;
            return Ok(None);
        }

        if self.settings.detect_incorrect_predictions && predicted != Some(current) {
            tracing::info!(
                "Audio prediction was wrong (predicted {}, player chose {}); reselecting",
                predicted.unwrap_or_default(),
                current
            );
            return self.run_with_current_audio();
        }

        self.session.last_audio = current;
        Ok(None)
    }

    /// The player reported a new track list. Reselect if the track count
    /// changed after playback started.
    pub fn on_track_list_changed(&mut self) -> Result<Option<Selection>> {
        let previous = self.session.registry.len();
        self.refresh_registry()?;

        if self.session.registry.len() == previous || !self.session.playback_started {
            return Ok(None);
        }

        tracing::debug!(
            "Track count changed ({} -> {}); reselecting",
            previous,
            self.session.registry.len()
        );
        self.run_with_current_audio()
    }

    /// The current audio track changed during playback.
    pub fn on_audio_changed(&mut self) -> Result<Option<Selection>> {
        if !self.settings.observe_audio_switches || !self.session.playback_started {
            return Ok(None);
        }

        let current = self.player.current_track(TrackSlot::Audio)?;
        if current == self.session.last_audio {
            return Ok(None);
        }

        tracing::info!(
            "Audio switched from {} to {}; reselecting",
            self.session.last_audio,
            current
        );
        self.run_with_current_audio()
    }

    /// Force a selection run against the player's current audio track.
    pub fn reselect(&mut self) -> Result<Option<Selection>> {
        self.refresh_registry()?;
        self.run_with_current_audio()
    }

    /// Enable, disable or toggle the engine. Disabling leaves the current
    /// tracks as they are; enabling reselects immediately.
    pub fn set_enabled(&mut self, command: ToggleCommand) -> Result<Option<Selection>> {
        let was_enabled = self.enabled;
        self.enabled = match command {
            ToggleCommand::Enable => true,
            ToggleCommand::Disable => false,
            ToggleCommand::Toggle => !self.enabled,
        };

        tracing::info!(
            "Track selection {}",
            if self.enabled { "enabled" } else { "disabled" }
        );

        if self.enabled && !was_enabled {
            return self.reselect();
        }
        Ok(None)
    }

    fn refresh_registry(&mut self) -> Result<()> {
        self.session.registry = TrackRegistry::from_raw(self.player.track_list()?);
        Ok(())
    }

    fn should_run(&self) -> Result<bool> {
        if !self.enabled {
            tracing::debug!("Track selection disabled; skipping");
            return Ok(false);
        }
        if self.session.registry.subtitles().is_empty() {
            tracing::debug!("No subtitle tracks; skipping");
            return Ok(false);
        }
        if !self.player.track_auto_selection()? {
            tracing::debug!("Player track auto-selection is off; skipping");
            return Ok(false);
        }
        Ok(true)
    }

    fn run_with_current_audio(&mut self) -> Result<Option<Selection>> {
        if !self.should_run()? {
            return Ok(None);
        }

        let current = self.player.current_track(TrackSlot::Audio)?;
        self.session.last_audio = current;

        let registry = &self.session.registry;
        let audio = match current {
            TrackChoice::Track(id) => {
                let track = registry.audio_by_id(id);
                if track.is_none() {
                    tracing::warn!("Current audio track {} is not in the track list", id);
                }
                track
            }
            TrackChoice::Disabled => None,
            // The player has not resolved `aid` yet.
            TrackChoice::Unset => {
                let option = self.player.audio_option()?;
                let priority = self.player.alang_priority()?;
                let predicted = predict_audio(registry.audio(), option, &priority);
                tracing::debug!(
                    "Current audio is unresolved; using predicted {}",
                    TrackChoice::from(predicted)
                );
                predicted
            }
        };

        let selection = self.engine.select(registry, AudioCandidates::Only(audio));
        self.apply(&selection)?;
        Ok(Some(selection))
    }

    fn select_and_apply(&mut self, candidates: AudioCandidates<'_>) -> Result<Selection> {
        let selection = self.engine.select(&self.session.registry, candidates);
        self.apply(&selection)?;
        Ok(selection)
    }

    /// Write a selection to the player. Each output is written only when it
    /// differs from the player's current value; unset outputs are skipped.
    fn apply(&mut self, selection: &Selection) -> Result<usize> {
        let mut writes = 0;

        if self.settings.select_audio && self.apply_track(TrackSlot::Audio, selection.audio)? {
            writes += 1;
        }
        if !selection.audio.is_unset() && self.settings.select_audio {
            self.session.last_audio = selection.audio;
        }

        if self.apply_track(TrackSlot::Sub, selection.sub)? {
            writes += 1;
        }
        if self.apply_track(TrackSlot::SecondarySub, selection.secondary_sub)? {
            writes += 1;
        }

        if let Some(visible) = selection.sub_visibility {
            if self.apply_visibility(VisibilitySlot::Primary, visible)? {
                writes += 1;
            }
        }
        if let Some(visible) = selection.secondary_sub_visibility {
            if self.apply_visibility(VisibilitySlot::Secondary, visible)? {
                writes += 1;
            }
        }

        tracing::debug!("Applied selection with {} property writes", writes);
        Ok(writes)
    }

    fn apply_track(&mut self, slot: TrackSlot, choice: TrackChoice) -> Result<bool> {
        if choice.is_unset() || self.player.current_track(slot)? == choice {
            return Ok(false);
        }
        tracing::info!("Setting {} to {}", slot.property(), choice);
        self.player.set_track(slot, choice)?;
        Ok(true)
    }

    fn apply_visibility(&mut self, slot: VisibilitySlot, visible: bool) -> Result<bool> {
        if self.player.sub_visibility(slot)? == visible {
            return Ok(false);
        }
        tracing::info!("Setting {} to {}", slot.property(), visible);
        self.player.set_sub_visibility(slot, visible)?;
        Ok(true)
    }
}
