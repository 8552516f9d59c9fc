//! Loading engine settings (TOML) and preference rules (JSON).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use tp_core::Settings;
use tp_rules::{MatchOptions, SelectionEngine};

/// Settings files tried, in order, when none is named explicitly.
const DEFAULT_SETTINGS_PATHS: [&str; 3] = [
    "./trackpick.toml",
    "~/.config/trackpick/config.toml",
    "/etc/trackpick/config.toml",
];

/// Expand a leading `~` in `path`.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Parse settings from a TOML string.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(content).context("Failed to parse settings")?;
    for warning in settings.validate() {
        tracing::warn!("Settings: {}", warning);
    }
    Ok(settings)
}

/// Load settings from a TOML file. A missing or malformed file is an error.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {:?}", path))?;

    parse_settings(&content).with_context(|| format!("Invalid settings file: {:?}", path))
}

/// Load settings from `custom_path`, or the first default location that
/// exists, or fall back to built-in defaults.
pub fn load_settings_or_default(custom_path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = custom_path {
        return load_settings(path);
    }

    for path_str in DEFAULT_SETTINGS_PATHS {
        let path = expand_path(Path::new(path_str));
        if path.exists() {
            tracing::debug!("Using settings file {:?}", path);
            return load_settings(&path);
        }
    }

    tracing::debug!("No settings file found; using defaults");
    Ok(Settings::default())
}

/// Load the preference rules and build the selection engine.
///
/// `rules_override` replaces `settings.rules_path`. Any failure here is
/// fatal: the engine never runs without a valid rule list.
pub fn load_engine(settings: &Settings, rules_override: Option<&Path>) -> Result<SelectionEngine> {
    let path = expand_path(rules_override.unwrap_or(&settings.rules_path));

    let rules = tp_rules::load_rules(&path)
        .with_context(|| format!("Failed to load preference rules: {:?}", path))?;

    tracing::info!("Loaded {} preference rules from {:?}", rules.len(), path);

    Ok(SelectionEngine::new(
        rules,
        MatchOptions {
            explicit_forced_subs: settings.explicit_forced_subs,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_partial_settings() {
        let settings = parse_settings("select_audio = true\npreload = false\n").unwrap();
        assert!(settings.select_audio);
        assert!(!settings.preload);
        assert!(settings.detect_incorrect_predictions);
    }

    #[test]
    fn parse_rejects_bad_types() {
        assert!(parse_settings("preload = \"yes\"").is_err());
    }

    #[test]
    fn missing_explicit_settings_file_is_error() {
        assert!(load_settings_or_default(Some(Path::new("/nonexistent/trackpick.toml"))).is_err());
    }

    #[test]
    fn expand_path_leaves_absolute_paths() {
        assert_eq!(
            expand_path(Path::new("/etc/trackpick/rules.json")),
            PathBuf::from("/etc/trackpick/rules.json")
        );
        assert!(!expand_path(Path::new("~/rules.json"))
            .to_string_lossy()
            .starts_with('~'));
    }

    #[test]
    fn load_engine_reads_rules_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"alang": "jpn", "slang": "eng"}}]"#).unwrap();

        let settings = Settings {
            rules_path: file.path().to_path_buf(),
            explicit_forced_subs: true,
            ..Default::default()
        };
        let engine = load_engine(&settings, None).unwrap();
        assert_eq!(engine.rules().len(), 1);
        assert!(engine.options().explicit_forced_subs);
    }

    #[test]
    fn load_engine_fails_on_malformed_rules() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[{{\"slang\": ").unwrap();
        let err = load_engine(&Settings::default(), Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("preference rules"));
    }

    #[test]
    fn load_engine_fails_on_missing_rules() {
        let settings = Settings {
            rules_path: PathBuf::from("/nonexistent/sub-select.json"),
            ..Default::default()
        };
        assert!(load_engine(&settings, None).is_err());
    }
}
