//! Rule conditions evaluated against the current candidate tracks.
//!
//! A [`Condition`] is parsed once when rules load. Each evaluation gets its
//! own [`Bindings`] table of shared references, so a condition can read the
//! candidates but never change them, and nothing carries over between calls.

use std::fmt;

use tp_core::Track;

use crate::expr::{self, Expr, ExprError, Value};

/// Read-only view of the tracks a condition may inspect.
///
/// `audio` is `None` for the "no audio" candidate. `secondary_sub` is only
/// populated for secondary-subtitle conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bindings<'a> {
    pub audio: Option<&'a Track>,
    pub sub: Option<&'a Track>,
    pub secondary_sub: Option<&'a Track>,
}

impl<'a> Bindings<'a> {
    /// Bindings for a `no` subtitle entry: only the audio candidate.
    pub fn audio_only(audio: Option<&'a Track>) -> Self {
        Self {
            audio,
            ..Default::default()
        }
    }

    /// Bindings for a primary-subtitle condition.
    pub fn primary(audio: Option<&'a Track>, sub: Option<&'a Track>) -> Self {
        Self {
            audio,
            sub,
            secondary_sub: None,
        }
    }

    /// Bindings for a secondary-subtitle condition.
    pub fn secondary(
        audio: Option<&'a Track>,
        sub: Option<&'a Track>,
        secondary_sub: &'a Track,
    ) -> Self {
        Self {
            audio,
            sub,
            secondary_sub: Some(secondary_sub),
        }
    }

    /// Resolve a bound name. `None` means the name is unknown; `Some(None)`
    /// means it is known but nothing is bound to it.
    pub fn lookup(&self, name: &str) -> Option<Option<&'a Track>> {
        match name {
            "audio" => Some(self.audio),
            "sub" => Some(self.sub),
            "secondary_sub" => Some(self.secondary_sub),
            _ => None,
        }
    }
}

/// A compiled condition expression.
#[derive(Clone)]
pub struct Condition {
    source: String,
    parsed: Result<Expr, ExprError>,
}

impl Condition {
    /// Parse `source`. A syntax error is logged here and the condition then
    /// evaluates to `false` every time.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = expr::parse(&source);
        if let Err(e) = &parsed {
            tracing::warn!("Invalid condition '{}': {}", source, e);
        }
        Self { source, parsed }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the expression parsed successfully.
    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }

    /// Parse error, if the expression failed to parse.
    pub fn error(&self) -> Option<&ExprError> {
        self.parsed.as_ref().err()
    }

    /// Evaluate against `bindings`.
    ///
    /// Only a result of exactly `true` passes. Evaluation errors are logged
    /// and count as `false`.
    pub fn evaluate(&self, bindings: &Bindings<'_>) -> bool {
        let expr = match &self.parsed {
            Ok(expr) => expr,
            Err(_) => return false,
        };

        match expr::evaluate(expr, bindings) {
            Ok(Value::Bool(true)) => true,
            Ok(other) => {
                tracing::trace!("Condition '{}' yielded {:?}", self.source, other);
                false
            }
            Err(e) => {
                tracing::warn!("Condition '{}' failed: {}", self.source, e);
                false
            }
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.source).finish()
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_passes() {
        let sub = Track::sub(1, "eng").with_codec("ass");
        let cond = Condition::parse("sub.codec == 'ass'");
        assert!(cond.evaluate(&Bindings::primary(None, Some(&sub))));
    }

    #[test]
    fn truthy_non_boolean_fails() {
        let sub = Track::sub(1, "eng").with_codec("ass");
        let cond = Condition::parse("sub.codec");
        assert!(!cond.evaluate(&Bindings::primary(None, Some(&sub))));
    }

    #[test]
    fn evaluation_error_is_false() {
        let cond = Condition::parse("sub.lang == 'eng'");
        assert!(!cond.evaluate(&Bindings::audio_only(None)));
    }

    #[test]
    fn parse_error_is_kept_and_false() {
        let cond = Condition::parse("sub.lang ==");
        assert!(!cond.is_valid());
        assert!(cond.error().is_some());
        let sub = Track::sub(1, "eng");
        assert!(!cond.evaluate(&Bindings::primary(None, Some(&sub))));
    }

    #[test]
    fn over_nested_condition_is_invalid() {
        let source = format!("{}sub.forced{}", "(".repeat(5_000), ")".repeat(5_000));
        let cond = Condition::parse(source);
        assert!(!cond.is_valid());
        let sub = Track::sub(1, "eng").with_forced(true);
        assert!(!cond.evaluate(&Bindings::primary(None, Some(&sub))));
    }

    #[test]
    fn audio_only_leaves_sub_unbound() {
        let audio = Track::audio(1, "jpn");
        let cond = Condition::parse("audio.lang == 'jpn' and sub == nil");
        assert!(cond.evaluate(&Bindings::audio_only(Some(&audio))));
    }

    #[test]
    fn secondary_bindings() {
        let sub = Track::sub(1, "eng");
        let secondary = Track::sub(2, "jpn");
        let cond = Condition::parse("secondary_sub.lang ~= sub.lang");
        assert!(cond.evaluate(&Bindings::secondary(None, Some(&sub), &secondary)));
        assert!(!cond.evaluate(&Bindings::primary(None, Some(&sub))));
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let audio = Track::audio(1, "jpn").with_default(true);
        let cond = Condition::parse("audio.default == true");
        let bindings = Bindings::audio_only(Some(&audio));
        let first = cond.evaluate(&bindings);
        for _ in 0..10 {
            assert_eq!(cond.evaluate(&bindings), first);
        }
        assert!(first);
    }
}
