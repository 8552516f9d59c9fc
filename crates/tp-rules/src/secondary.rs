//! Secondary subtitle resolution for the winning rule.

use tp_core::{Track, TrackChoice};

use crate::condition::Bindings;
use crate::matcher::sub_matches;
use crate::rule::{LangFilter, SubtitleFilter};

/// Pick the secondary subtitle once a primary result exists.
///
/// Without a `secondary_slang` the result is `Unset`. A `no` entry yields
/// `Disabled` immediately. Otherwise the first track (other than the
/// primary) that passes the filters and condition wins; if none does, the
/// result is `Unset`, not `Disabled`.
pub fn resolve_secondary(
    filter: Option<&SubtitleFilter>,
    audio: Option<&Track>,
    primary: Option<&Track>,
    subtitles: &[Track],
    explicit_forced_subs: bool,
) -> TrackChoice {
    let Some(filter) = filter else {
        return TrackChoice::Unset;
    };

    let primary_id = primary.map(|t| t.id);

    for slang in &filter.slang {
        if *slang == LangFilter::No {
            return TrackChoice::Disabled;
        }

        let found = subtitles
            .iter()
            .filter(|candidate| Some(candidate.id) != primary_id)
            .find(|candidate| {
                sub_matches(
                    candidate,
                    slang,
                    filter.whitelist.as_deref(),
                    filter.blacklist.as_deref(),
                    explicit_forced_subs,
                ) && filter.condition.as_ref().map_or(true, |c| {
                    c.evaluate(&Bindings::secondary(audio, primary, candidate))
                })
            });

        if let Some(track) = found {
            tracing::trace!("Secondary subtitle {} matched '{}'", track, slang);
            return TrackChoice::Track(track.id);
        }
    }

    TrackChoice::Unset
}
