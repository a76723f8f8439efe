// Editor Configuration
// Persisted editor settings in TOML under the platform config directory

use crate::richtext::export::SizeTag;
use crate::richtext::font::FontDescriptor;
use crate::richtext::measure::MeasureFallback;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::warn;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "RichText";
const APPLICATION: &str = "richtext";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font for new runs and for sizing empty lines
    pub default_font: FontDescriptor,
    pub word_wrap: bool,
    pub read_only: bool,
    pub blink_interval_ms: u64,
    /// Size to tag table for HTML export
    pub size_tags: Vec<SizeTag>,
    /// Metrics used when the measurer cannot resolve a font
    pub measure_fallback: MeasureFallback,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            default_font: FontDescriptor::default(),
            word_wrap: true,
            read_only: false,
            blink_interval_ms: 600,
            size_tags: SizeTag::default_table(),
            measure_fallback: MeasureFallback::default(),
        }
    }
}

impl EditorConfig {
    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }
}

/// Default location of the config file
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Read a config file; a missing file is not an error
pub fn load_config(path: &Path) -> Result<Option<EditorConfig>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(toml::from_str(&contents)?))
}

/// Read a config file, falling back to defaults on any problem
pub fn load_config_or_default(path: &Path) -> EditorConfig {
    match load_config(path) {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable config");
            EditorConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &EditorConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let toml = toml::to_string_pretty(config)?;
    fs::write(path, toml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = load_config(&dir.path().join("nope.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = EditorConfig {
            word_wrap: false,
            blink_interval_ms: 250,
            measure_fallback: MeasureFallback::DefaultFont,
            ..Default::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "read_only = true\nmeasure_fallback = \"default_font\"\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert!(config.read_only);
        assert!(config.word_wrap);
        assert_eq!(config.measure_fallback, MeasureFallback::DefaultFont);
        assert_eq!(config.blink_interval(), Duration::from_millis(600));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "word_wrap = false\nlink_color = \"#0645ad\"\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert!(!config.word_wrap);
        assert_eq!(config.blink_interval_ms, 600);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "word_wrap = [").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        assert_eq!(load_config_or_default(&path), EditorConfig::default());
    }
}
