//! Audio and subtitle predicates used by the selection engine.

use tp_core::Track;

use crate::pattern::{title_matches_any, Pattern};
use crate::rule::LangFilter;

/// Check an audio candidate (`None` = no audio) against an `alang` list.
///
/// Entries are tried in order and the first one that matches wins.
pub fn audio_matches(audio: Option<&Track>, alang: &[LangFilter]) -> bool {
    alang.iter().any(|filter| match (filter, audio) {
        (LangFilter::No, None) => true,
        (_, None) | (LangFilter::No, Some(_)) => false,
        (LangFilter::Any, Some(_)) => true,
        (LangFilter::Default, Some(track)) => track.default,
        (LangFilter::Forced, Some(track)) => track.forced,
        (LangFilter::Pattern(pattern), Some(track)) => pattern.is_match(&track.lang),
    })
}

/// Check a subtitle track against one `slang` entry and the title filters.
///
/// `LangFilter::No` never matches here; disabling is decided by the engine.
/// With `explicit_forced_subs`, forced tracks only match the `forced` entry.
pub fn sub_matches(
    sub: &Track,
    slang: &LangFilter,
    whitelist: Option<&[Pattern]>,
    blacklist: Option<&[Pattern]>,
    explicit_forced_subs: bool,
) -> bool {
    let lang_ok = match slang {
        LangFilter::No => false,
        LangFilter::Default => sub.default,
        LangFilter::Forced => sub.forced,
        LangFilter::Any | LangFilter::Pattern(_) if explicit_forced_subs && sub.forced => false,
        LangFilter::Any => true,
        LangFilter::Pattern(pattern) => pattern.is_match(&sub.lang),
    };
    if !lang_ok {
        return false;
    }

    let title = sub.title.as_deref();

    if let Some(whitelist) = whitelist {
        if !title_matches_any(title, whitelist) {
            tracing::trace!("{} rejected: title not whitelisted", sub);
            return false;
        }
    }

    if let Some(blacklist) = blacklist {
        if title_matches_any(title, blacklist) {
            tracing::trace!("{} rejected: title blacklisted", sub);
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(values: &[&str]) -> Vec<LangFilter> {
        values.iter().map(|v| LangFilter::parse(v)).collect()
    }

    fn titles(values: &[&str]) -> Vec<Pattern> {
        values.iter().map(|v| Pattern::title(v)).collect()
    }

    #[test]
    fn alang_no_matches_only_absent_audio() {
        let eng = Track::audio(1, "eng");
        assert!(audio_matches(None, &filters(&["no"])));
        assert!(!audio_matches(Some(&eng), &filters(&["no"])));
    }

    #[test]
    fn alang_star_requires_audio() {
        let eng = Track::audio(1, "eng");
        assert!(audio_matches(Some(&eng), &filters(&["*"])));
        assert!(!audio_matches(None, &filters(&["*"])));
    }

    #[test]
    fn alang_flags() {
        let plain = Track::audio(1, "eng");
        let default = Track::audio(2, "eng").with_default(true);
        let forced = Track::audio(3, "eng").with_forced(true);
        assert!(audio_matches(Some(&default), &filters(&["default"])));
        assert!(!audio_matches(Some(&plain), &filters(&["default"])));
        assert!(audio_matches(Some(&forced), &filters(&["forced"])));
        assert!(!audio_matches(Some(&plain), &filters(&["forced"])));
    }

    #[test]
    fn alang_patterns_try_each_entry() {
        let jpn = Track::audio(1, "jpn");
        assert!(audio_matches(Some(&jpn), &filters(&["eng", "jp"])));
        assert!(!audio_matches(Some(&jpn), &filters(&["eng", "fre"])));
        assert!(audio_matches(None, &filters(&["eng", "no"])));
    }

    #[test]
    fn slang_pattern_and_star() {
        let eng = Track::sub(1, "eng");
        assert!(sub_matches(&eng, &LangFilter::parse("eng"), None, None, false));
        assert!(sub_matches(&eng, &LangFilter::parse("*"), None, None, false));
        assert!(!sub_matches(&eng, &LangFilter::parse("jpn"), None, None, false));
        assert!(!sub_matches(&eng, &LangFilter::No, None, None, false));
    }

    #[test]
    fn slang_flags() {
        let default = Track::sub(1, "eng").with_default(true);
        let forced = Track::sub(2, "eng").with_forced(true);
        assert!(sub_matches(&default, &LangFilter::Default, None, None, false));
        assert!(!sub_matches(&forced, &LangFilter::Default, None, None, false));
        assert!(sub_matches(&forced, &LangFilter::Forced, None, None, true));
        assert!(!sub_matches(&default, &LangFilter::Forced, None, None, false));
    }

    #[test]
    fn explicit_forced_policy() {
        let forced = Track::sub(1, "eng").with_forced(true);
        let eng = LangFilter::parse("eng");
        assert!(sub_matches(&forced, &eng, None, None, false));
        assert!(!sub_matches(&forced, &eng, None, None, true));
        assert!(!sub_matches(&forced, &LangFilter::Any, None, None, true));
    }

    #[test]
    fn whitelist_requires_title() {
        let full = Track::sub(1, "eng").with_title("Full Subtitles");
        let untitled = Track::sub(2, "eng");
        let whitelist = titles(&["FULL", "dialogue"]);
        let eng = LangFilter::parse("eng");
        assert!(sub_matches(&full, &eng, Some(&whitelist), None, false));
        assert!(!sub_matches(&untitled, &eng, Some(&whitelist), None, false));
    }

    #[test]
    fn blacklist_overrides_whitelist() {
        let signs = Track::sub(1, "eng").with_title("Full + Signs");
        let eng = LangFilter::parse("eng");
        let whitelist = titles(&["full"]);
        let blacklist = titles(&["signs"]);
        assert!(!sub_matches(&signs, &eng, Some(&whitelist), Some(&blacklist), false));
    }

    #[test]
    fn blacklist_ignores_untitled() {
        let untitled = Track::sub(1, "eng");
        let blacklist = titles(&["signs"]);
        assert!(sub_matches(&untitled, &LangFilter::Any, None, Some(&blacklist), false));
    }
}
