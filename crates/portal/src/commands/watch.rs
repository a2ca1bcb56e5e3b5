use async_trait::async_trait;
use eyre::Result;
use portal_core::AppState;
use portal_core::push::PushEvent;
use portal_core::store::NotificationCounters;
use serde_json::Value;
use std::io::Write;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{Command, interrupted};
use crate::error::Error;

pub struct WatchCommand;

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        if state.session.token().is_none() {
            return Err(Error::NotLoggedIn.into());
        }

        let services = state.services()?;
        if let Err(e) = services.notifications.sync_counters(&state.notifications).await {
            warn!(target: "portal::watch", error = %e, "Could not load unread counters");
        }

        let push = state.push_client();
        let mut events = push.subscribe();
        let cancel = CancellationToken::new();
        let task = push.spawn(cancel.clone());

        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}", counters_line(&state.notifications.snapshot()))?;
        writeln!(stdout, "Watching for notifications, Ctrl-C to stop")?;

        loop {
            tokio::select! {
                biased;
                () = interrupted() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        writeln!(stdout, "{}", describe(&event))?;
                        writeln!(stdout, "{}", counters_line(&state.notifications.snapshot()))?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "portal::watch", skipped, "Output fell behind the push channel");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        cancel.cancel();
        task.await??;
        Ok(())
    }
}

fn counters_line(counters: &NotificationCounters) -> String {
    format!(
        "[{}] {} unread notifications, {} unread messages",
        if counters.connected { "live" } else { "offline" },
        counters.unread_notifications,
        counters.unread_messages
    )
}

fn field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

fn describe(event: &PushEvent) -> String {
    match event {
        PushEvent::Notification(data) => format!(
            "notification: {}",
            field(data, "title").unwrap_or("(untitled)")
        ),
        PushEvent::Message(data) => {
            let preview = field(data, "content").unwrap_or_default();
            format!("message: {preview}")
        }
        PushEvent::UnreadCount(counts) => format!(
            "unread: {} notifications, {} messages",
            counts.notifications, counts.messages
        ),
        PushEvent::Connected(_) => "connected".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_are_summarised() {
        let note = PushEvent::Notification(json!({"id": 1, "title": "Lin liked your post"}));
        assert_eq!(describe(&note), "notification: Lin liked your post");
        assert_eq!(
            describe(&PushEvent::Notification(json!({}))),
            "notification: (untitled)"
        );
    }

    #[test]
    fn counters_show_connection() {
        let counters = NotificationCounters {
            unread_notifications: 2,
            unread_messages: 0,
            connected: true,
        };
        assert_eq!(
            counters_line(&counters),
            "[live] 2 unread notifications, 0 unread messages"
        );
    }
}
