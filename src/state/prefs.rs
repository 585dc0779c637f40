//! Persisted language and theme preferences.
//!
//! Both are read once at startup and written back on every change. Unknown
//! or missing stored values fall back to the defaults (`en`, `system`).

#[cfg(test)]
#[path = "prefs_test.rs"]
mod prefs_test;

use std::sync::Arc;

use tracing::debug;

use crate::i18n::Language;
use crate::storage::{KeyValueStore, LANGUAGE_KEY, StorageError, THEME_KEY};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system's dark-mode preference.
    #[default]
    System,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Whether dark styling applies, given the system preference.
    #[must_use]
    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::System => system_prefers_dark,
        }
    }
}

pub struct Preferences {
    storage: Arc<dyn KeyValueStore>,
    language: Language,
    theme: Theme,
}

impl Preferences {
    /// Read both preferences from `storage`.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let language = storage
            .get(LANGUAGE_KEY)
            .and_then(|raw| Language::from_code(&raw))
            .unwrap_or_default();
        let theme = storage
            .get(THEME_KEY)
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default();
        debug!(language = language.code(), theme = theme.as_str(), "preferences loaded");
        Self { storage, language, theme }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the choice cannot be persisted; the
    /// in-memory value is left unchanged in that case.
    pub fn set_language(&mut self, language: Language) -> Result<(), StorageError> {
        self.storage.set(LANGUAGE_KEY, language.code())?;
        self.language = language;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the choice cannot be persisted.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StorageError> {
        self.storage.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    /// Flip the effective mode and pin it as an explicit choice.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the new theme cannot be persisted.
    pub fn toggle_dark(&mut self, system_prefers_dark: bool) -> Result<Theme, StorageError> {
        let next = if self.theme.is_dark(system_prefers_dark) { Theme::Light } else { Theme::Dark };
        self.set_theme(next)?;
        Ok(next)
    }
}
