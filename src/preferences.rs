//! Persisted user preferences
//!
//! A flat JSON object of string keys and values on disk. The only value
//! stored today is the theme, under `darkMode`.

use crate::{
    constants::{PREFERENCES_FILE, THEME_PREFERENCE_KEY},
    error::PreferenceError,
    types::Theme,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key-value preference file
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, PreferenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Map::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self
            .read_all()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Stores `value` under `key`, keeping the other entries
    pub fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), Value::String(value.to_string()));
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }

    /// Saved theme, or the system preference when nothing is saved
    pub fn load_theme(&self, prefers_dark: bool) -> Theme {
        match self.get(THEME_PREFERENCE_KEY) {
            Ok(Some(value)) if value == Theme::Dark.as_str() => Theme::Dark,
            Ok(Some(_)) => Theme::Light,
            Ok(None) if prefers_dark => Theme::Dark,
            Ok(None) => Theme::Light,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read theme preference");
                if prefers_dark {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        self.set(THEME_PREFERENCE_KEY, theme.as_str())
    }

    /// Flips the saved theme and returns the new one
    pub fn toggle_theme(&self, prefers_dark: bool) -> Result<Theme, PreferenceError> {
        let theme = self.load_theme(prefers_dark).toggled();
        self.save_theme(theme)?;
        Ok(theme)
    }
}

impl Default for PreferenceStore {
    /// Store in the working directory
    fn default() -> Self {
        Self::new(PREFERENCES_FILE)
    }
}
