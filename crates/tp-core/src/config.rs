//! Engine settings.
//!
//! [`Settings`] controls when and how selection runs. Every field defaults
//! sensibly so an empty settings file is valid. The preference rules live in
//! a separate JSON file named by [`Settings::rules_path`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the preference rules file.
pub const DEFAULT_RULES_PATH: &str = "~/.config/trackpick/sub-select.json";

/// Options for the selection controller and matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the JSON preference rules (tilde-expanded at load).
    pub rules_path: PathBuf,
    /// Select tracks before playback starts, predicting the default audio.
    pub preload: bool,
    /// Predict the audio track even when audio selection is enabled.
    pub force_prediction: bool,
    /// Re-run selection when the host's actual audio differs from the prediction.
    pub detect_incorrect_predictions: bool,
    /// Re-run selection whenever the audio track is switched during playback.
    pub observe_audio_switches: bool,
    /// Only select forced subtitles when a rule asks for them explicitly.
    pub explicit_forced_subs: bool,
    /// Let the matched rule choose the audio track as well.
    pub select_audio: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            preload: true,
            force_prediction: false,
            detect_incorrect_predictions: true,
            observe_audio_switches: false,
            explicit_forced_subs: false,
            select_audio: false,
        }
    }
}

impl Settings {
    /// Whether the first selection of a file may choose among all audio tracks.
    pub fn chooses_audio(&self) -> bool {
        self.select_audio && !self.force_prediction
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.force_prediction && !self.select_audio {
            warnings.push(
                "force_prediction has no effect unless select_audio is enabled".into(),
            );
        }

        if !self.preload && self.force_prediction {
            warnings.push("force_prediction has no effect when preload is disabled".into());
        }

        if self.rules_path.as_os_str().is_empty() {
            warnings.push("rules_path is empty".into());
        }

        warnings
    }
}
