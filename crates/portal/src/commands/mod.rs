use async_trait::async_trait;
use comfy_table::{Cell, Color, Table};
use eyre::Result;
use portal_core::AppState;

pub mod auth;
pub mod chat;
pub mod imagine;
pub mod notifications;
pub mod posts;
pub mod preferences;
pub mod watch;

#[async_trait]
pub trait Command {
    async fn execute(&self, state: &AppState) -> Result<()>;
}

/// Table with a highlighted header row.
pub(crate) fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Green))
            .collect::<Vec<_>>(),
    );
    table
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
pub(crate) async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Server timestamps come as ISO-8601; show date and minutes.
pub(crate) fn short_time(raw: &str) -> &str {
    raw.get(..16).unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_time_trims_seconds() {
        assert_eq!(short_time("2024-05-01T10:42:13.123"), "2024-05-01T10:42");
        assert_eq!(short_time("today"), "today");
    }
}
