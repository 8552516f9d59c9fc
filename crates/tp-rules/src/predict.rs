//! Guessing the player's default audio track before it resolves one.
//!
//! Used in preload mode, where subtitles must be chosen before playback
//! starts and the player has not yet picked its own audio track.

use tp_core::{AudioOption, Track};

/// Ordering key for a candidate audio track. Compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PredictionKey {
    /// `n - j` for a language found at position `j` of an `n`-entry
    /// priority list; 0 when not listed.
    priority_rank: usize,
    is_default: bool,
    /// Earlier-declared tracks score higher.
    reverse_position: usize,
}

fn priority_rank(lang: &str, alang_priority: &[String]) -> usize {
    alang_priority
        .iter()
        .position(|l| l == lang)
        .map_or(0, |j| alang_priority.len() - j)
}

/// Predict which audio track the player will choose by default.
///
/// Returns `None` when the prediction is "no audio". An explicit option
/// wins; a single track is always chosen; a forced track is chosen as soon
/// as it is seen; otherwise the track with the greatest key wins and ties go
/// to the earliest track.
pub fn predict_audio<'a>(
    audio: &'a [Track],
    option: AudioOption,
    alang_priority: &[String],
) -> Option<&'a Track> {
    match option {
        AudioOption::No => return None,
        AudioOption::Track(id) => {
            let track = audio.iter().find(|t| t.id == id);
            if track.is_none() {
                tracing::warn!("Audio option names missing track {}", id);
            }
            return track;
        }
        AudioOption::Auto => {}
    }

    match audio {
        [] => return None,
        [only] => return Some(only),
        _ => {}
    }

    let total = audio.len();
    let mut best: Option<(PredictionKey, &Track)> = None;

    for track in audio {
        if track.forced {
            tracing::debug!("Predicted audio {} (forced)", track);
            return Some(track);
        }

        let key = PredictionKey {
            priority_rank: priority_rank(&track.lang, alang_priority),
            is_default: track.default,
            reverse_position: total.saturating_sub(track.id as usize),
        };

        if best.map_or(true, |(best_key, _)| key > best_key) {
            best = Some((key, track));
        }
    }

    let predicted = best.map(|(_, track)| track);
    if let Some(track) = predicted {
        tracing::debug!("Predicted audio {}", track);
    }
    predicted
}
