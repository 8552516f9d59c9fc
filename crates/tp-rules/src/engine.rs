//! The [`SelectionEngine`] matches a track snapshot against the rule list.

use serde::Serialize;
use std::iter;

use tp_core::{Track, TrackChoice, TrackRegistry};

use crate::condition::Bindings;
use crate::matcher::{audio_matches, sub_matches};
use crate::rule::{LangFilter, Rule};
use crate::secondary::resolve_secondary;

/// Which audio candidates the engine may consider.
#[derive(Debug, Clone, Copy)]
pub enum AudioCandidates<'a> {
    /// Every audio track in list order, then the "no audio" candidate.
    All,
    /// Exactly this candidate (`None` = no audio).
    Only(Option<&'a Track>),
}

/// Matcher options that are not part of the rules themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Forced subtitles only match an explicit `forced` entry.
    pub explicit_forced_subs: bool,
}

/// The outcome of one selection run. All `Unset` means no rule matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Index of the winning rule.
    pub rule_index: Option<usize>,
    pub audio: TrackChoice,
    pub sub: TrackChoice,
    pub secondary_sub: TrackChoice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_visibility: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_sub_visibility: Option<bool>,
}

impl Selection {
    /// Whether any rule matched.
    pub fn is_match(&self) -> bool {
        self.rule_index.is_some()
    }
}

/// Primary subtitle decision for one slang entry.
enum Primary<'a> {
    Disabled,
    Track(&'a Track),
}

/// Rule engine holding the ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    /// Rules in file order; earlier rules take priority.
    rules: Vec<Rule>,
    options: MatchOptions,
}

impl SelectionEngine {
    pub fn new(rules: Vec<Rule>, options: MatchOptions) -> Self {
        Self { rules, options }
    }

    /// Return a reference to the internal rules slice.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Find the first rule, audio candidate and slang entry that yield a
    /// primary subtitle decision, then resolve its secondary subtitle.
    ///
    /// Search order is rule, then audio candidate, then slang entry, then
    /// subtitle track, each in list order; the first hit ends the search.
    pub fn select(&self, registry: &TrackRegistry, audio: AudioCandidates<'_>) -> Selection {
        let candidates: Vec<Option<&Track>> = match audio {
            AudioCandidates::All => registry
                .audio()
                .iter()
                .map(Some)
                .chain(iter::once(None))
                .collect(),
            AudioCandidates::Only(track) => vec![track],
        };

        for rule in &self.rules {
            for &audio in &candidates {
                if !audio_matches(audio, &rule.alang) {
                    continue;
                }

                for slang in &rule.primary.slang {
                    let Some(primary) = self.resolve_primary(rule, audio, slang, registry) else {
                        continue;
                    };

                    let primary_track = match primary {
                        Primary::Track(track) => Some(track),
                        Primary::Disabled => None,
                    };

                    let secondary_sub = resolve_secondary(
                        rule.secondary.as_ref(),
                        audio,
                        primary_track,
                        registry.subtitles(),
                        self.options.explicit_forced_subs,
                    );

                    let selection = Selection {
                        rule_index: Some(rule.index),
                        audio: TrackChoice::from(audio),
                        sub: TrackChoice::from(primary_track),
                        secondary_sub,
                        sub_visibility: rule.sub_visibility,
                        secondary_sub_visibility: rule.secondary_sub_visibility,
                    };

                    tracing::debug!(
                        "Matched {} (audio={}, sub={}, secondary_sub={})",
                        rule,
                        selection.audio,
                        selection.sub,
                        selection.secondary_sub
                    );
                    return selection;
                }
            }
        }

        tracing::debug!("No preference rule matched; deferring to player defaults");
        Selection::default()
    }

    fn resolve_primary<'t>(
        &self,
        rule: &Rule,
        audio: Option<&Track>,
        slang: &LangFilter,
        registry: &'t TrackRegistry,
    ) -> Option<Primary<'t>> {
        let filter = &rule.primary;

        if *slang == LangFilter::No {
            let allowed = filter
                .condition
                .as_ref()
                .map_or(true, |c| c.evaluate(&Bindings::audio_only(audio)));
            return allowed.then_some(Primary::Disabled);
        }

        registry
            .subtitles()
            .iter()
            .find(|sub| {
                sub_matches(
                    sub,
                    slang,
                    filter.whitelist.as_deref(),
                    filter.blacklist.as_deref(),
                    self.options.explicit_forced_subs,
                ) && filter
                    .condition
                    .as_ref()
                    .map_or(true, |c| c.evaluate(&Bindings::primary(audio, Some(*sub))))
            })
            .map(Primary::Track)
    }
}
