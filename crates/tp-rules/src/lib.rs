//! # tp-rules
//!
//! Preference rules and the matching engine for track selection.
//!
//! ## Overview
//!
//! - [`Pattern`] -- substring-style matching for languages and titles.
//! - [`Condition`] -- an optional boolean expression attached to a rule,
//!   evaluated against a read-only [`Bindings`] table.
//! - [`Rule`] -- a validated rule compiled from a [`PreferenceRule`].
//! - [`SelectionEngine`] -- walks the rules in order and returns the first
//!   audio/subtitle/secondary-subtitle combination that satisfies one.
//! - [`predict_audio`] -- guesses the player's default audio track.

pub mod condition;
pub mod engine;
pub mod expr;
pub mod matcher;
pub mod pattern;
pub mod predict;
pub mod rule;
pub mod secondary;

pub use condition::{Bindings, Condition};
pub use engine::{AudioCandidates, MatchOptions, Selection, SelectionEngine};
pub use expr::{evaluate, Expr, ExprError, Value};
pub use matcher::{audio_matches, sub_matches};
pub use pattern::{matches, Pattern};
pub use predict::predict_audio;
pub use rule::{load_rules, parse_rules, LangFilter, PreferenceRule, Rule};
pub use secondary::resolve_secondary;
