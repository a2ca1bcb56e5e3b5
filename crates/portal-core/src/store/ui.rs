use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tokio::sync::watch;
use tracing::warn;

use super::persist::{StateStorage, UI_KEY, load_json, save_json};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Preferences that survive a restart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UiPreferences {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub sidebar_collapsed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiState {
    pub preferences: UiPreferences,
    pub mobile_menu_open: bool,
    pub loading: bool,
    pub page_loading: bool,
}

#[derive(Clone)]
pub struct UiStore {
    tx: Arc<watch::Sender<UiState>>,
    storage: Arc<dyn StateStorage>,
}

impl UiStore {
    pub fn load(storage: Arc<dyn StateStorage>) -> Self {
        let preferences = load_json::<UiPreferences>(storage.as_ref(), UI_KEY).unwrap_or_default();
        let (tx, _rx) = watch::channel(UiState {
            preferences,
            ..UiState::default()
        });
        Self {
            tx: Arc::new(tx),
            storage,
        }
    }

    pub fn snapshot(&self) -> UiState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.tx.subscribe()
    }

    pub fn preferences(&self) -> UiPreferences {
        self.tx.borrow().preferences
    }

    pub fn locale(&self) -> Locale {
        self.tx.borrow().preferences.locale
    }

    pub fn theme(&self) -> Theme {
        self.tx.borrow().preferences.theme
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.tx.borrow().preferences.sidebar_collapsed
    }

    pub fn set_locale(&self, locale: Locale) {
        self.update_preferences(|p| p.locale = locale);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update_preferences(|p| p.theme = theme);
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.update_preferences(|p| p.sidebar_collapsed = collapsed);
    }

    pub fn toggle_sidebar(&self) {
        self.update_preferences(|p| p.sidebar_collapsed = !p.sidebar_collapsed);
    }

    /// Restore defaults and drop the persisted copy.
    pub fn reset_preferences(&self) {
        self.tx
            .send_modify(|s| s.preferences = UiPreferences::default());
        if let Err(e) = self.storage.remove(UI_KEY) {
            warn!(target: "portal::ui", error = %e, "Failed to remove UI preferences");
        }
    }

    pub fn set_mobile_menu_open(&self, open: bool) {
        self.tx.send_modify(|s| s.mobile_menu_open = open);
    }

    pub fn toggle_mobile_menu(&self) {
        self.tx.send_modify(|s| s.mobile_menu_open = !s.mobile_menu_open);
    }

    pub fn set_loading(&self, loading: bool) {
        self.tx.send_modify(|s| s.loading = loading);
    }

    pub fn set_page_loading(&self, loading: bool) {
        self.tx.send_modify(|s| s.page_loading = loading);
    }

    fn update_preferences<F>(&self, update: F)
    where
        F: FnOnce(&mut UiPreferences),
    {
        self.tx.send_modify(|s| update(&mut s.preferences));
        let preferences = self.preferences();
        if let Err(e) = save_json(self.storage.as_ref(), UI_KEY, &preferences) {
            warn!(target: "portal::ui", error = %e, "Failed to persist UI preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStorage;
    use std::str::FromStr;

    #[test]
    fn defaults_are_chinese_dark_expanded() {
        let ui = UiStore::load(Arc::new(MemoryStateStorage::new()));
        assert_eq!(ui.locale(), Locale::Zh);
        assert_eq!(ui.theme(), Theme::Dark);
        assert!(!ui.sidebar_collapsed());
    }

    #[test]
    fn only_preferences_survive_reload() {
        let storage = Arc::new(MemoryStateStorage::new());
        let ui = UiStore::load(storage.clone());
        ui.set_locale(Locale::En);
        ui.toggle_sidebar();
        ui.set_mobile_menu_open(true);
        ui.set_loading(true);

        let reloaded = UiStore::load(storage);
        let state = reloaded.snapshot();
        assert_eq!(state.preferences.locale, Locale::En);
        assert!(state.preferences.sidebar_collapsed);
        assert!(!state.mobile_menu_open);
        assert!(!state.loading);
    }

    #[test]
    fn reset_restores_defaults() {
        let storage = Arc::new(MemoryStateStorage::new());
        let ui = UiStore::load(storage.clone());
        ui.set_theme(Theme::Light);
        ui.reset_preferences();
        assert_eq!(ui.theme(), Theme::Dark);
        assert_eq!(storage.load(UI_KEY).unwrap(), None);
    }

    #[test]
    fn enums_parse_and_display_lowercase() {
        assert_eq!(Locale::from_str("en").unwrap(), Locale::En);
        assert_eq!(Theme::Light.to_string(), "light");
        assert!(Theme::from_str("neon").is_err());
    }
}
