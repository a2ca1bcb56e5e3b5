use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, PageQuery, UserBrief};
use crate::api::{ApiClient, ApiError};
use crate::document::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: Document,
    #[serde(default)]
    pub content_text: Option<String>,
    pub post_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserBrief,
}

/// A comment with its nested replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// This comment plus every reply below it.
    pub fn thread_size(&self) -> usize {
        1 + self.replies.iter().map(Self::thread_size).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentTree {
    pub comments: Vec<CommentNode>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentCreate {
    pub post_id: i64,
    pub content: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CommentUpdate<'a> {
    content: &'a Document,
}

#[derive(Clone)]
pub struct CommentService {
    client: ApiClient,
}

impl CommentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn tree_for_post(&self, post_id: i64) -> Result<CommentTree, ApiError> {
        self.client
            .get(&format!("/comments/post/{post_id}"))
            .await
    }

    pub async fn flat_for_post(
        &self,
        post_id: i64,
        page: PageQuery,
    ) -> Result<Page<Comment>, ApiError> {
        self.client
            .get_with(&format!("/comments/post/{post_id}/flat"), &page)
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Comment, ApiError> {
        self.client.get(&format!("/comments/{id}")).await
    }

    pub async fn create(&self, comment: &CommentCreate) -> Result<Comment, ApiError> {
        self.client.post("/comments", comment).await
    }

    pub async fn update(&self, id: i64, content: &Document) -> Result<Comment, ApiError> {
        self.client
            .put(&format!("/comments/{id}"), &CommentUpdate { content })
            .await
    }

    /// Soft-delete by default; `hard` removes the row.
    pub async fn delete(&self, id: i64, hard: bool) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete_with(&format!("/comments/{id}"), &[("hard", hard)])
            .await?;
        Ok(())
    }

    pub async fn by_user(&self, user_id: i64, page: PageQuery) -> Result<Page<Comment>, ApiError> {
        self.client
            .get_with(&format!("/comments/user/{user_id}"), &page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(id: i64, parent: Option<i64>, replies: Value) -> Value {
        json!({
            "id": id,
            "content": {"type": "doc", "content": []},
            "content_text": "",
            "post_id": 1,
            "user_id": 2,
            "parent_id": parent,
            "depth": 0,
            "path": id.to_string(),
            "like_count": 0,
            "reply_count": 0,
            "is_deleted": false,
            "created_at": "2024-05-01T10:00:00",
            "updated_at": "2024-05-01T10:00:00",
            "user": {"id": 2, "username": "wu", "nickname": null, "avatar": null},
            "replies": replies
        })
    }

    #[test]
    fn tree_parses_nested_replies() {
        let tree: CommentTree = serde_json::from_value(json!({
            "comments": [comment(1, None, json!([
                comment(2, Some(1), json!([comment(3, Some(2), json!([]))]))
            ]))],
            "total": 3
        }))
        .unwrap();

        let root = &tree.comments[0];
        assert_eq!(root.thread_size(), 3);
        assert_eq!(root.replies[0].comment.parent_id, Some(1));
        assert_eq!(root.replies[0].replies[0].comment.id, 3);
    }
}
