//! Client-side state containers.
//!
//! Each store wraps a `tokio::sync::watch` channel: readers take cheap
//! snapshots or subscribe for change notification, writers mutate through
//! named actions. Only the session and the durable UI preferences are written
//! through a [`StateStorage`] adapter; everything else lives in memory.

pub mod ai;
pub mod notifications;
pub mod persist;
pub mod session;
pub mod ui;

pub use ai::{AiMode, AiState, AiStore};
pub use notifications::{NotificationCounters, NotificationStore};
pub use persist::{
    FileStateStorage, MemoryStateStorage, SESSION_KEY, StateStorage, StorageError, UI_KEY,
};
pub use session::{SessionState, SessionStore, User};
pub use ui::{Locale, Theme, UiPreferences, UiState, UiStore};
