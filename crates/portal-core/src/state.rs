use std::sync::Arc;

use crate::api::{ApiClient, NoticeSink, TracingNoticeSink};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::push::PushClient;
use crate::services::Services;
use crate::store::{
    AiStore, FileStateStorage, MemoryStateStorage, NotificationStore, SessionStore,
    StateStorage, UiStore,
};
use crate::utils::paths::AppPaths;

/// Root context owning every store. Front ends build one at start-up and
/// hand out clones.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub session: SessionStore,
    pub ui: UiStore,
    pub notifications: NotificationStore,
    pub ai: AiStore,
    storage: Arc<dyn StateStorage>,
}

impl AppState {
    /// Restore persisted state from `storage`.
    pub fn new(config: ClientConfig, storage: Arc<dyn StateStorage>) -> Self {
        Self {
            session: SessionStore::load(storage.clone()),
            ui: UiStore::load(storage.clone()),
            notifications: NotificationStore::new(),
            ai: AiStore::new(),
            config,
            storage,
        }
    }

    /// State persisted under the user's data directory.
    pub fn load(config: ClientConfig) -> Result<Self> {
        let dir = AppPaths::state_dir().ok_or_else(|| {
            Error::Configuration("Could not determine a data directory".to_string())
        })?;
        Ok(Self::new(config, Arc::new(FileStateStorage::new(dir))))
    }

    /// Nothing survives the process.
    pub fn in_memory(config: ClientConfig) -> Self {
        Self::new(config, Arc::new(MemoryStateStorage::new()))
    }

    pub fn storage(&self) -> &Arc<dyn StateStorage> {
        &self.storage
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        self.api_client_with_notices(Arc::new(TracingNoticeSink))
    }

    pub fn api_client_with_notices(&self, notices: Arc<dyn NoticeSink>) -> Result<ApiClient> {
        Ok(ApiClient::with_notice_sink(
            self.config.clone(),
            self.session.clone(),
            notices,
        )?)
    }

    pub fn services(&self) -> Result<Services> {
        Ok(Services::new(&self.api_client()?))
    }

    pub fn push_client(&self) -> PushClient {
        PushClient::new(
            self.config.clone(),
            self.session.clone(),
            self.notifications.clone(),
        )
    }
}
