use super::Command;
use crate::error::Error;
use async_trait::async_trait;
use eyre::Result;
use portal_core::AppState;
use portal_core::store::{Locale, Theme, UiPreferences, UiStore};
use portal_core::utils::paths::AppPaths;
use std::io::Write;

pub struct PreferencesCommand {
    pub action: PreferencesAction,
}

pub enum PreferencesAction {
    Show,
    Set {
        theme: Option<Theme>,
        locale: Option<Locale>,
        sidebar_collapsed: Option<bool>,
    },
    Reset,
}

#[async_trait]
impl Command for PreferencesCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        match &self.action {
            PreferencesAction::Show => self.show(state).map_err(Into::into),
            PreferencesAction::Set {
                theme,
                locale,
                sidebar_collapsed,
            } => {
                apply(&state.ui, *theme, *locale, *sidebar_collapsed);
                self.show(state).map_err(Into::into)
            }
            PreferencesAction::Reset => {
                state.ui.reset_preferences();
                let mut stdout = std::io::stdout();
                writeln!(stdout, "Preferences reset to defaults")?;
                Ok(())
            }
        }
    }
}

impl PreferencesCommand {
    fn show(&self, state: &AppState) -> std::result::Result<(), Error> {
        let prefs: UiPreferences = state.ui.preferences();
        let mut stdout = std::io::stdout();

        if let Some(path) = AppPaths::user_config_file() {
            writeln!(stdout, "Config file: {}", path.display())?;
        }
        writeln!(stdout, "API: {}", state.config.api_base_url)?;
        writeln!(stdout, "\n{}", toml::to_string_pretty(&prefs)?)?;
        Ok(())
    }
}

fn apply(
    ui: &UiStore,
    theme: Option<Theme>,
    locale: Option<Locale>,
    sidebar_collapsed: Option<bool>,
) {
    if let Some(theme) = theme {
        ui.set_theme(theme);
    }
    if let Some(locale) = locale {
        ui.set_locale(locale);
    }
    if let Some(collapsed) = sidebar_collapsed {
        ui.set_sidebar_collapsed(collapsed);
    }
}
