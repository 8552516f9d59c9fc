//! Unified error type for trackpick.
//!
//! Library crates return [`Result`]; the binary wraps these in `anyhow` for
//! context. Only load-time failures are meant to be fatal; everything that
//! can go wrong mid-selection is logged and degraded locally instead.

/// Unified error type covering all failure modes in trackpick.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("Config error [{path}]: {message}")]
    Config {
        /// Where the configuration came from (a path, or `<inline>`).
        path: String,
        /// Human-readable error description.
        message: String,
    },

    /// A preference rule failed validation at load time.
    #[error("Invalid rule rules[{index}]: {message}")]
    InvalidRule {
        /// Position of the offending rule in the rule list.
        index: usize,
        /// Human-readable error description.
        message: String,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reading or writing a player property failed.
    #[error("Player error: {0}")]
    Player(String),
}

impl Error {
    /// Convenience constructor for [`Error::Config`].
    pub fn config(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::InvalidRule`].
    pub fn invalid_rule(index: usize, message: impl Into<String>) -> Self {
        Error::InvalidRule {
            index,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Player`].
    pub fn player(message: impl Into<String>) -> Self {
        Error::Player(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rule_names_position() {
        let err = Error::invalid_rule(3, "missing required field `slang`");
        assert_eq!(
            err.to_string(),
            "Invalid rule rules[3]: missing required field `slang`"
        );
    }

    #[test]
    fn config_display() {
        let err = Error::config("/tmp/sub-select.json", "expected `[`");
        assert_eq!(
            err.to_string(),
            "Config error [/tmp/sub-select.json]: expected `[`"
        );
    }

    #[test]
    fn io_from_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn player_display() {
        let err = Error::player("property unavailable: aid");
        assert_eq!(err.to_string(), "Player error: property unavailable: aid");
    }
}
