use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationCounters {
    pub unread_notifications: u64,
    pub unread_messages: u64,
    pub connected: bool,
}

/// Unread counters fed by REST reads and push events. Last write wins.
#[derive(Clone)]
pub struct NotificationStore {
    tx: Arc<watch::Sender<NotificationCounters>>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(NotificationCounters::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> NotificationCounters {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationCounters> {
        self.tx.subscribe()
    }

    pub fn set_unread_notifications(&self, count: u64) {
        self.tx.send_modify(|c| c.unread_notifications = count);
    }

    pub fn set_unread_messages(&self, count: u64) {
        self.tx.send_modify(|c| c.unread_messages = count);
    }

    pub fn increment_notifications(&self) {
        self.tx
            .send_modify(|c| c.unread_notifications = c.unread_notifications.saturating_add(1));
    }

    pub fn increment_messages(&self) {
        self.tx
            .send_modify(|c| c.unread_messages = c.unread_messages.saturating_add(1));
    }

    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|c| {
            let changed = c.connected != connected;
            c.connected = connected;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_absolute_sets() {
        let store = NotificationStore::new();
        store.increment_notifications();
        store.increment_notifications();
        store.increment_messages();
        assert_eq!(store.snapshot().unread_notifications, 2);
        assert_eq!(store.snapshot().unread_messages, 1);

        store.set_unread_notifications(9);
        store.set_unread_messages(0);
        let counters = store.snapshot();
        assert_eq!(counters.unread_notifications, 9);
        assert_eq!(counters.unread_messages, 0);
    }

    #[test]
    fn connected_flag_only_notifies_on_change() {
        let store = NotificationStore::new();
        let mut rx = store.subscribe();
        store.set_connected(false);
        assert!(!rx.has_changed().unwrap());
        store.set_connected(true);
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();
        assert!(rx.borrow().connected);
    }
}
