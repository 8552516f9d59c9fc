//! Track descriptors and selection outcome types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Language code assumed when the host reports none.
pub const UNDETERMINED_LANG: &str = "und";

/// Kind of media stream a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    #[serde(alias = "subtitle")]
    Sub,
    Video,
}

impl TrackType {
    /// The name this type is reported under (`audio`, `sub`, `video`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Audio => "audio",
            TrackType::Sub => "sub",
            TrackType::Video => "video",
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A track entry exactly as the host reports it.
///
/// Every field the host supplies beyond the typed ones is kept in `extra` so
/// conditions can read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrack {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A normalized, immutable track record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Positive id, unique within its type.
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: TrackType,
    /// Language code; `und` when the host reported none.
    pub lang: String,
    pub title: Option<String>,
    pub default: bool,
    pub forced: bool,
    pub codec: Option<String>,
    /// Opaque host-supplied fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Track {
    /// Build a track with the given id, type and language and no flags set.
    pub fn new(id: u32, kind: TrackType, lang: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            lang: lang.into(),
            title: None,
            default: false,
            forced: false,
            codec: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Shorthand for an audio track.
    pub fn audio(id: u32, lang: impl Into<String>) -> Self {
        Self::new(id, TrackType::Audio, lang)
    }

    /// Shorthand for a subtitle track.
    pub fn sub(id: u32, lang: impl Into<String>) -> Self {
        Self::new(id, TrackType::Sub, lang)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} ({})", self.kind, self.id, self.lang)?;
        if let Some(title) = &self.title {
            write!(f, " '{title}'")?;
        }
        if self.default {
            f.write_str(" [default]")?;
        }
        if self.forced {
            f.write_str(" [forced]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TrackChoice
// ---------------------------------------------------------------------------

/// The outcome for one track slot.
///
/// `Disabled` is an explicit "no track" decision; `Unset` means no decision
/// was made and the host default stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackChoice {
    Track(u32),
    Disabled,
    #[default]
    Unset,
}

impl TrackChoice {
    /// The selected track id, if a concrete track was chosen.
    pub fn id(&self) -> Option<u32> {
        match self {
            TrackChoice::Track(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, TrackChoice::Unset)
    }
}

impl From<Option<&Track>> for TrackChoice {
    fn from(track: Option<&Track>) -> Self {
        match track {
            Some(t) => TrackChoice::Track(t.id),
            None => TrackChoice::Disabled,
        }
    }
}

impl fmt::Display for TrackChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackChoice::Track(id) => write!(f, "{id}"),
            TrackChoice::Disabled => f.write_str("no"),
            TrackChoice::Unset => f.write_str("auto"),
        }
    }
}

impl FromStr for TrackChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "auto" | "unset" => Ok(TrackChoice::Unset),
            "no" | "disabled" => Ok(TrackChoice::Disabled),
            other => match other.parse::<u32>() {
                Ok(0) => Ok(TrackChoice::Disabled),
                Ok(id) => Ok(TrackChoice::Track(id)),
                Err(_) => Err(Error::Validation(format!(
                    "invalid track choice '{other}' (expected an id, 'no' or 'auto')"
                ))),
            },
        }
    }
}

impl Serialize for TrackChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TrackChoice::Track(id) => serializer.serialize_u32(*id),
            TrackChoice::Disabled => serializer.serialize_str("disabled"),
            TrackChoice::Unset => serializer.serialize_str("unset"),
        }
    }
}

impl<'de> Deserialize<'de> for TrackChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Number(n) => {
                let id = n
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid track id {n}")))?;
                Ok(if id == 0 {
                    TrackChoice::Disabled
                } else {
                    TrackChoice::Track(id)
                })
            }
            serde_json::Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            serde_json::Value::Bool(false) => Ok(TrackChoice::Disabled),
            serde_json::Value::Null => Ok(TrackChoice::Unset),
            other => Err(serde::de::Error::custom(format!(
                "invalid track choice: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioOption
// ---------------------------------------------------------------------------

/// The host's audio-selection option (`auto`, `no`, or an explicit id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioOption {
    #[default]
    Auto,
    No,
    Track(u32),
}

impl FromStr for AudioOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<TrackChoice>()? {
            TrackChoice::Unset => Ok(AudioOption::Auto),
            TrackChoice::Disabled => Ok(AudioOption::No),
            TrackChoice::Track(id) => Ok(AudioOption::Track(id)),
        }
    }
}

impl fmt::Display for AudioOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOption::Auto => f.write_str("auto"),
            AudioOption::No => f.write_str("no"),
            AudioOption::Track(id) => write!(f, "{id}"),
        }
    }
}
