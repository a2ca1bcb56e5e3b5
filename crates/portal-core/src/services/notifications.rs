use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, UserBrief};
use crate::api::{ApiClient, ApiError};
use crate::store::NotificationStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: String,
    #[serde(default)]
    pub read_at: Option<String>,
    #[serde(default)]
    pub actor: Option<UserBrief>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    #[serde(flatten)]
    pub page: Page<Notification>,
    #[serde(default)]
    pub unread_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationQuery {
    pub page: u32,
    pub size: u32,
    pub unread_only: bool,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            unread_only: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct MarkedRead {
    marked_read: u64,
}

#[derive(Debug, Deserialize)]
struct Deleted {
    deleted: u64,
}

#[derive(Debug, Serialize)]
struct MarkRead<'a> {
    notification_ids: Option<&'a [i64]>,
}

#[derive(Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &NotificationQuery) -> Result<NotificationPage, ApiError> {
        self.client.get_with("/notifications", query).await
    }

    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let count: Count = self.client.get("/notifications/unread-count").await?;
        Ok(count.count)
    }

    /// Mark the given notifications read, or all of them when `ids` is
    /// `None`. Returns how many changed.
    pub async fn mark_read(&self, ids: Option<&[i64]>) -> Result<u64, ApiError> {
        let marked: MarkedRead = self
            .client
            .post(
                "/notifications/read",
                &MarkRead {
                    notification_ids: ids,
                },
            )
            .await?;
        Ok(marked.marked_read)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/notifications/{id}"))
            .await?;
        Ok(())
    }

    /// Remove notifications older than `days`. Returns how many went.
    pub async fn cleanup(&self, days: u32) -> Result<u64, ApiError> {
        let deleted: Deleted = self
            .client
            .delete_with("/notifications/cleanup", &[("days", days)])
            .await?;
        Ok(deleted.deleted)
    }

    /// Load both unread counters into `store`.
    pub async fn sync_counters(&self, store: &NotificationStore) -> Result<(), ApiError> {
        let notifications = self.unread_count().await?;
        let messages: Count = self.client.get("/messages/unread-count").await?;
        store.set_unread_notifications(notifications);
        store.set_unread_messages(messages.count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_keeps_unread_total() {
        let page: NotificationPage = serde_json::from_value(json!({
            "items": [{
                "id": 1,
                "type": "comment",
                "title": "New comment on your post",
                "content": null,
                "entity_type": "post",
                "entity_id": 12,
                "is_read": false,
                "created_at": "2024-05-01T10:00:00",
                "read_at": null,
                "actor": {"id": 3, "username": "an", "nickname": null, "avatar": null},
                "data": null
            }],
            "total": 1,
            "page": 1,
            "size": 20,
            "pages": 1,
            "unread_count": 4
        }))
        .unwrap();
        assert_eq!(page.unread_count, 4);
        assert_eq!(page.page.items[0].kind, "comment");
    }

    #[test]
    fn mark_all_sends_null_ids() {
        let body = serde_json::to_value(MarkRead {
            notification_ids: None,
        })
        .unwrap();
        assert_eq!(body, json!({"notification_ids": null}));
    }
}
