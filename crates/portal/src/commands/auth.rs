use async_trait::async_trait;
use comfy_table::Cell;
use eyre::Result;
use portal_core::AppState;
use rpassword::prompt_password;
use std::io::Write;

use super::{Command, table};
use crate::error::Error;

pub struct LoginCommand {
    pub username: String,
    pub password: Option<String>,
}

#[async_trait]
impl Command for LoginCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_password(format!("Password for {}: ", self.username))?,
        };

        let services = state.services()?;
        let user = services.auth.login(&self.username, &password).await?;

        let mut stdout = std::io::stdout();
        writeln!(stdout, "Logged in as {}", user.display_name())?;
        Ok(())
    }
}

pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let mut stdout = std::io::stdout();
        if state.session.token().is_none() {
            writeln!(stdout, "Not logged in")?;
            return Ok(());
        }
        state.services()?.auth.logout().await;
        writeln!(stdout, "Logged out")?;
        Ok(())
    }
}

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let services = state.services()?;
        if !services.auth.check_auth().await {
            return Err(Error::NotLoggedIn.into());
        }
        let Some(user) = state.session.user() else {
            return Err(Error::NotLoggedIn.into());
        };

        let mut table = table(&["Field", "Value"]);
        let rows = [
            ("ID", user.id.to_string()),
            ("Username", user.username.clone()),
            ("Nickname", user.nickname.clone().unwrap_or_default()),
            ("Email", user.email.clone()),
            ("Role", user.role.clone()),
            ("Language", user.language_preference.clone()),
            ("Member since", super::short_time(&user.created_at).to_string()),
        ];
        for (field, value) in rows {
            table.add_row(vec![Cell::new(field), Cell::new(value)]);
        }

        let mut stdout = std::io::stdout();
        writeln!(stdout, "{table}")?;
        Ok(())
    }
}
