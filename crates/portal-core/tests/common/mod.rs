use axum::Router;
use portal_core::api::{ApiClient, Notice};
use portal_core::config::ClientConfig;
use portal_core::store::{MemoryStateStorage, SessionStore};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_PREFIX: &str = "/api/v1";

/// Serve `app` on an ephemeral port and return its address.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("{addr}")
}

pub fn config_for(addr: &str) -> ClientConfig {
    let mut config = ClientConfig::with_base_url(&format!("http://{addr}{API_PREFIX}")).unwrap();
    config.request_timeout = Duration::from_secs(5);
    config
}

pub fn empty_session() -> SessionStore {
    SessionStore::load(Arc::new(MemoryStateStorage::new()))
}

/// Collects every notice raised by a client.
#[derive(Clone, Default)]
pub struct Notices(Arc<Mutex<Vec<Notice>>>);

impl Notices {
    pub fn taken(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub fn client_with_notices(addr: &str, session: SessionStore) -> (ApiClient, Notices) {
    let notices = Notices::default();
    let sink = notices.clone();
    let client = ApiClient::with_notice_sink(
        config_for(addr),
        session,
        Arc::new(move |notice: Notice| sink.0.lock().unwrap().push(notice)),
    )
    .unwrap();
    (client, notices)
}

pub fn user_json(username: &str) -> Value {
    json!({
        "id": 11,
        "username": username,
        "email": format!("{username}@example.com"),
        "nickname": null,
        "avatar": null,
        "bio": null,
        "role": "user",
        "language_preference": "en",
        "is_active": true,
        "created_at": "2024-03-01T08:00:00",
        "updated_at": "2024-03-01T08:00:00"
    })
}
