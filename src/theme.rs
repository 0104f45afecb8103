//! Light/dark theme preference.
//!
//! Reads the stored preference from the `theme` key and falls back to the
//! system preference when nothing usable is stored. Persistence is best
//! effort: a failed write is logged and the in-memory choice still applies.

use std::str::FromStr;

use tracing::warn;

use crate::storage::KeyValueStore;

/// Storage key holding `light` or `dark`.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown theme `{0}` (expected `light` or `dark`)")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the stored theme, or derive it from `system_prefers_dark`.
pub fn read_preference(store: &dyn KeyValueStore, system_prefers_dark: bool) -> Theme {
    let fallback = if system_prefers_dark { Theme::Dark } else { Theme::Light };
    match store.get(THEME_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|e: UnknownTheme| {
            warn!(error = %e, "ignoring stored theme");
            fallback
        }),
        Ok(None) => fallback,
        Err(e) => {
            warn!(error = %e, "theme preference unreadable");
            fallback
        }
    }
}

/// Persist `theme`.
pub fn save_preference(store: &dyn KeyValueStore, theme: Theme) {
    if let Err(e) = store.set(THEME_KEY, theme.as_str()) {
        warn!(error = %e, %theme, "failed to persist theme");
    }
}

/// Flip `current`, persist the result, and return it.
pub fn toggle(store: &dyn KeyValueStore, current: Theme) -> Theme {
    let next = current.toggled();
    save_preference(store, next);
    next
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
