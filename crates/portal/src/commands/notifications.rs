use async_trait::async_trait;
use comfy_table::Cell;
use eyre::Result;
use portal_core::AppState;
use portal_core::services::notifications::{Notification, NotificationQuery};
use std::io::Write;

use super::{Command, short_time, table};

pub struct NotificationsCommand {
    pub action: NotificationsAction,
}

pub enum NotificationsAction {
    List { unread_only: bool, page: u32 },
    Read { ids: Vec<i64> },
    Cleanup { days: u32 },
}

#[async_trait]
impl Command for NotificationsCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let service = state.services()?.notifications;
        let mut stdout = std::io::stdout();

        match &self.action {
            NotificationsAction::List { unread_only, page } => {
                let listing = service
                    .list(&NotificationQuery {
                        page: *page,
                        unread_only: *unread_only,
                        ..NotificationQuery::default()
                    })
                    .await?;
                state
                    .notifications
                    .set_unread_notifications(listing.unread_count);

                if listing.page.items.is_empty() {
                    writeln!(stdout, "No notifications.")?;
                    return Ok(());
                }
                let mut table = table(&["ID", "", "Type", "Title", "From", "When"]);
                for item in &listing.page.items {
                    table.add_row(row(item));
                }
                writeln!(stdout, "{table}")?;
                writeln!(stdout, "{} unread", listing.unread_count)?;
            }
            NotificationsAction::Read { ids } => {
                let ids = (!ids.is_empty()).then_some(ids.as_slice());
                let marked = service.mark_read(ids).await?;
                service.sync_counters(&state.notifications).await?;
                writeln!(stdout, "Marked {marked} as read")?;
            }
            NotificationsAction::Cleanup { days } => {
                let deleted = service.cleanup(*days).await?;
                writeln!(stdout, "Removed {deleted} notifications older than {days} days")?;
            }
        }
        Ok(())
    }
}

fn row(item: &Notification) -> Vec<Cell> {
    vec![
        Cell::new(item.id),
        Cell::new(if item.is_read { "" } else { "●" }),
        Cell::new(&item.kind),
        Cell::new(&item.title),
        Cell::new(
            item.actor
                .as_ref()
                .map(|a| a.display_name().to_string())
                .unwrap_or_default(),
        ),
        Cell::new(short_time(&item.created_at)),
    ]
}
