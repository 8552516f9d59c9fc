//! Preference rules: the JSON shape users write and the compiled form the
//! matcher runs.
//!
//! Loading is eager. String-or-list fields are normalized to ordered lists,
//! sentinel tokens become [`LangFilter`] variants, and every pattern and
//! condition is compiled once, so matching never re-parses configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use tp_core::{Error, Result};

use crate::condition::Condition;
use crate::pattern::Pattern;

/// A field that accepts either one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringList::One(s) => vec![s],
            StringList::Many(v) => v,
        }
    }
}

/// One preference rule as written in the rules file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alang: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slang: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_slang: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_whitelist: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_blacklist: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_visibility: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_sub_visibility: Option<bool>,
    /// Keys this version does not understand; reported and ignored.
    #[serde(flatten)]
    pub unknown: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// One entry of an `alang`, `slang` or `secondary_slang` list.
#[derive(Debug, Clone, PartialEq)]
pub enum LangFilter {
    /// `no`: no audio present, or the subtitle disabled.
    No,
    /// `*`: anything present.
    Any,
    /// `default`: the track carries the default flag.
    Default,
    /// `forced`: the track carries the forced flag.
    Forced,
    /// Any other value, matched as a pattern against the language code.
    Pattern(Pattern),
}

impl LangFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "no" => LangFilter::No,
            "*" => LangFilter::Any,
            "default" => LangFilter::Default,
            "forced" => LangFilter::Forced,
            other => LangFilter::Pattern(Pattern::new(other)),
        }
    }
}

impl fmt::Display for LangFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LangFilter::No => f.write_str("no"),
            LangFilter::Any => f.write_str("*"),
            LangFilter::Default => f.write_str("default"),
            LangFilter::Forced => f.write_str("forced"),
            LangFilter::Pattern(p) => f.write_str(p.as_str()),
        }
    }
}

/// Language list plus title filters and condition for one subtitle slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleFilter {
    pub slang: Vec<LangFilter>,
    pub whitelist: Option<Vec<Pattern>>,
    pub blacklist: Option<Vec<Pattern>>,
    pub condition: Option<Condition>,
}

/// A validated, compiled preference rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Position in the rules file; lower is higher priority.
    pub index: usize,
    pub alang: Vec<LangFilter>,
    pub primary: SubtitleFilter,
    pub secondary: Option<SubtitleFilter>,
    pub sub_visibility: Option<bool>,
    pub secondary_sub_visibility: Option<bool>,
}

fn lang_list(index: usize, field: &str, list: StringList) -> Result<Vec<LangFilter>> {
    let values = list.into_vec();
    if values.is_empty() {
        return Err(Error::invalid_rule(index, format!("`{field}` must not be empty")));
    }
    Ok(values.iter().map(|v| LangFilter::parse(v)).collect())
}

fn title_list(list: Option<StringList>) -> Option<Vec<Pattern>> {
    list.map(|l| l.into_vec().iter().map(|p| Pattern::title(p)).collect())
}

impl Rule {
    /// Validate and compile one rule. `index` is its position in the file.
    pub fn compile(index: usize, raw: PreferenceRule) -> Result<Self> {
        for key in raw.unknown.keys() {
            tracing::warn!("rules[{}]: ignoring unknown key `{}`", index, key);
        }

        let alang = match raw.alang {
            Some(list) => lang_list(index, "alang", list)?,
            None => vec![LangFilter::Any],
        };

        let slang = raw
            .slang
            .ok_or_else(|| Error::invalid_rule(index, "missing required field `slang`"))?;

        let primary = SubtitleFilter {
            slang: lang_list(index, "slang", slang)?,
            whitelist: title_list(raw.whitelist),
            blacklist: title_list(raw.blacklist),
            condition: raw.condition.map(Condition::parse),
        };

        let secondary = match raw.secondary_slang {
            Some(list) => Some(SubtitleFilter {
                slang: lang_list(index, "secondary_slang", list)?,
                whitelist: title_list(raw.secondary_whitelist),
                blacklist: title_list(raw.secondary_blacklist),
                condition: raw.secondary_condition.map(Condition::parse),
            }),
            None => {
                if raw.secondary_whitelist.is_some()
                    || raw.secondary_blacklist.is_some()
                    || raw.secondary_condition.is_some()
                {
                    tracing::warn!(
                        "rules[{}]: secondary filters are ignored without `secondary_slang`",
                        index
                    );
                }
                None
            }
        };

        Ok(Self {
            index,
            alang,
            primary,
            secondary,
            sub_visibility: raw.sub_visibility,
            secondary_sub_visibility: raw.secondary_sub_visibility,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |filters: &[LangFilter]| {
            filters
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(
            f,
            "rules[{}] alang=[{}] slang=[{}]",
            self.index,
            join(&self.alang),
            join(&self.primary.slang)
        )?;
        if let Some(secondary) = &self.secondary {
            write!(f, " secondary_slang=[{}]", join(&secondary.slang))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn parse_rules_from(json: &str, origin: &str) -> Result<Vec<Rule>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| Error::config(origin, e))?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let raw: PreferenceRule = serde_json::from_value(value)
                .map_err(|e| Error::invalid_rule(index, e.to_string()))?;
            Rule::compile(index, raw)
        })
        .collect()
}

/// Parse and compile a JSON array of rules.
pub fn parse_rules(json: &str) -> Result<Vec<Rule>> {
    parse_rules_from(json, "<inline>")
}

/// Read, parse and compile the rules file at `path`.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let contents = std::fs::read_to_string(path)?;
    let rules = parse_rules_from(&contents, &path.display().to_string())?;
    tracing::debug!("Loaded {} preference rules from {}", rules.len(), path.display());
    Ok(rules)
}
