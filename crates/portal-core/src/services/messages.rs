use serde::{Deserialize, Serialize};

use super::{Page, PageQuery, UserBrief};
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: String,
    #[serde(default)]
    pub read_at: Option<String>,
    pub sender: UserBrief,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub other_user: UserBrief,
    pub last_message_at: String,
    #[serde(default)]
    pub last_message_preview: Option<String>,
    #[serde(default)]
    pub unread_count: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(flatten)]
    pub page: Page<DirectMessage>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
struct MessageCreate<'a> {
    recipient_id: i64,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MarkedRead {
    marked_read: u64,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

#[derive(Clone)]
pub struct MessageService {
    client: ApiClient,
}

impl MessageService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn conversations(&self, page: PageQuery) -> Result<Page<Conversation>, ApiError> {
        self.client
            .get_with("/messages/conversations", &page)
            .await
    }

    pub async fn messages(
        &self,
        conversation_id: i64,
        page: PageQuery,
    ) -> Result<MessagePage, ApiError> {
        self.client
            .get_with(&format!("/messages/conversations/{conversation_id}"), &page)
            .await
    }

    pub async fn send(&self, recipient_id: i64, content: &str) -> Result<DirectMessage, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::InvalidInput("message must not be empty".into()));
        }
        self.client
            .post(
                "/messages",
                &MessageCreate {
                    recipient_id,
                    content,
                },
            )
            .await
    }

    pub async fn mark_read(&self, conversation_id: i64) -> Result<u64, ApiError> {
        let marked: MarkedRead = self
            .client
            .post_empty(&format!("/messages/conversations/{conversation_id}/read"))
            .await?;
        Ok(marked.marked_read)
    }

    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let count: Count = self.client.get("/messages/unread-count").await?;
        Ok(count.count)
    }
}
