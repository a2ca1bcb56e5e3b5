use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::persist::{SESSION_KEY, StateStorage, load_json, save_json};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub language_preference: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Nickname when set, username otherwise.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

/// The subset of [`SessionState`] written to storage.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: Option<User>,
    token: Option<String>,
    #[serde(default)]
    is_authenticated: bool,
}

/// Authentication session: current user and bearer token.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionState>>,
    storage: Arc<dyn StateStorage>,
}

impl SessionStore {
    /// Restore the persisted session, if any, from `storage`.
    pub fn load(storage: Arc<dyn StateStorage>) -> Self {
        let state = load_json::<PersistedSession>(storage.as_ref(), SESSION_KEY)
            .map(|p| SessionState {
                user: p.user,
                token: p.token,
                is_authenticated: p.is_authenticated,
                is_loading: false,
            })
            .unwrap_or_default();
        let (tx, _rx) = watch::channel(state);
        Self {
            tx: Arc::new(tx),
            storage,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.tx.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.tx.borrow().user.as_ref().is_some_and(User::is_admin)
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().is_loading
    }

    pub fn set_user(&self, user: Option<User>) {
        self.tx.send_modify(|s| {
            s.is_authenticated = user.is_some();
            s.user = user;
        });
        self.persist();
    }

    pub fn set_token(&self, token: Option<String>) {
        self.tx.send_modify(|s| s.token = token);
        self.persist();
    }

    pub fn login(&self, user: User, token: String) {
        debug!(target: "portal::session", user = %user.username, "Session established");
        self.tx.send_modify(|s| {
            s.user = Some(user);
            s.token = Some(token);
            s.is_authenticated = true;
            s.is_loading = false;
        });
        self.persist();
    }

    pub fn logout(&self) {
        self.tx.send_modify(|s| *s = SessionState::default());
        self.persist();
    }

    /// Apply `update` to the current user. Returns false when logged out.
    pub fn update_user<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut User),
    {
        let changed = self.tx.send_if_modified(|s| match s.user.as_mut() {
            Some(user) => {
                update(user);
                true
            }
            None => false,
        });
        if changed {
            self.persist();
        }
        changed
    }

    pub fn set_loading(&self, loading: bool) {
        self.tx.send_modify(|s| s.is_loading = loading);
    }

    /// Clear the session because the server rejected `token`.
    ///
    /// Only the first caller holding the current token performs the
    /// transition; later callers with the same (now stale) token get `false`.
    pub fn expire(&self, token: &str) -> bool {
        let expired = self.tx.send_if_modified(|s| {
            if s.token.as_deref() == Some(token) {
                *s = SessionState::default();
                true
            } else {
                false
            }
        });
        if expired {
            debug!(target: "portal::session", "Session expired by server");
            self.persist();
        }
        expired
    }

    fn persist(&self) {
        let persisted = {
            let state = self.tx.borrow();
            PersistedSession {
                user: state.user.clone(),
                token: state.token.clone(),
                is_authenticated: state.is_authenticated,
            }
        };
        let result = if persisted.token.is_none() && persisted.user.is_none() {
            self.storage.remove(SESSION_KEY)
        } else {
            save_json(self.storage.as_ref(), SESSION_KEY, &persisted)
        };
        if let Err(e) = result {
            warn!(target: "portal::session", error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(role: &str) -> User {
    User {
        id: 7,
        username: "mei".into(),
        email: "mei@example.com".into(),
        nickname: None,
        avatar: None,
        bio: None,
        role: role.into(),
        language_preference: "zh".into(),
        is_active: true,
        created_at: "2024-01-01T00:00:00".into(),
        updated_at: "2024-01-01T00:00:00".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStorage;

    fn store() -> (SessionStore, Arc<MemoryStateStorage>) {
        let storage = Arc::new(MemoryStateStorage::new());
        (SessionStore::load(storage.clone()), storage)
    }

    #[test]
    fn login_persists_and_reload_restores() {
        let (session, storage) = store();
        session.login(sample_user("user"), "tok".into());

        let restored = SessionStore::load(storage);
        let state = restored.snapshot();
        assert_eq!(state.token.as_deref(), Some("tok"));
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.user.unwrap().username, "mei");
    }

    #[test]
    fn logout_clears_storage() {
        let (session, storage) = store();
        session.login(sample_user("user"), "tok".into());
        session.logout();

        assert_eq!(storage.load(SESSION_KEY).unwrap(), None);
        assert_eq!(session.snapshot(), SessionState::default());
    }

    #[test]
    fn expire_transitions_once_per_token() {
        let (session, _) = store();
        session.login(sample_user("user"), "tok".into());

        let mut rx = session.subscribe();
        rx.mark_unchanged();

        assert!(session.expire("tok"));
        assert!(!session.expire("tok"));
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(session.user(), None);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn expire_ignores_stale_tokens() {
        let (session, _) = store();
        session.login(sample_user("user"), "new".into());
        assert!(!session.expire("old"));
        assert!(session.is_authenticated());
    }

    #[test]
    fn update_user_requires_a_user() {
        let (session, _) = store();
        assert!(!session.update_user(|u| u.bio = Some("hi".into())));

        session.login(sample_user("admin"), "tok".into());
        assert!(session.update_user(|u| u.nickname = Some("Mei".into())));
        assert_eq!(session.user().unwrap().display_name(), "Mei");
        assert!(session.is_admin());
    }

    #[test]
    fn set_user_drives_authenticated_flag() {
        let (session, _) = store();
        session.set_user(Some(sample_user("user")));
        assert!(session.is_authenticated());
        session.set_user(None);
        assert!(!session.is_authenticated());
    }
}
