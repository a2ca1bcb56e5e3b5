use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Page;
use super::posts::PostStatus;
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: u64,
    pub new_today: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStats {
    pub total: u64,
    pub published: u64,
    pub this_week: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStats {
    pub total: u64,
    pub this_week: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub users: UserStats,
    pub posts: PostStats,
    pub comments: CommentStats,
    pub categories: u64,
    pub tags: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminComment {
    pub id: i64,
    #[serde(default)]
    pub content_text: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub user: Option<AuthorRef>,
    #[serde(default)]
    pub post: Option<PostRef>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminTag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub post_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCreate {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Moderation endpoints. The server rejects non-admin sessions with 403.
#[derive(Clone)]
pub struct AdminService {
    client: ApiClient,
}

impl AdminService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.client.get("/admin/stats").await
    }

    pub async fn users(&self, filter: &UserFilter) -> Result<Page<AdminUser>, ApiError> {
        self.client.get_with("/admin/users", filter).await
    }

    pub async fn update_user(&self, user_id: i64, change: &UserChange) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .patch_with(&format!("/admin/users/{user_id}"), change)
            .await?;
        Ok(())
    }

    pub async fn posts(&self, filter: &PostFilter) -> Result<Page<AdminPost>, ApiError> {
        self.client.get_with("/admin/posts", filter).await
    }

    pub async fn set_post_status(&self, post_id: i64, status: PostStatus) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .patch_with(&format!("/admin/posts/{post_id}"), &[("status", status)])
            .await?;
        Ok(())
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/admin/posts/{post_id}"))
            .await?;
        Ok(())
    }

    pub async fn comments(&self, filter: &CommentFilter) -> Result<Page<AdminComment>, ApiError> {
        self.client.get_with("/admin/comments", filter).await
    }

    pub async fn delete_comment(&self, comment_id: i64, hard: bool) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete_with(&format!("/admin/comments/{comment_id}"), &[("hard", hard)])
            .await?;
        Ok(())
    }

    pub async fn restore_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .send_json(self.client.request(
                Method::PATCH,
                &format!("/admin/comments/{comment_id}/restore"),
            ))
            .await?;
        Ok(())
    }

    pub async fn create_category(
        &self,
        category: &CategoryCreate,
    ) -> Result<CreatedCategory, ApiError> {
        self.client
            .send_json(
                self.client
                    .request(Method::POST, "/admin/categories")
                    .query(category),
            )
            .await
    }

    pub async fn update_category(
        &self,
        category_id: i64,
        change: &CategoryChange,
    ) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .patch_with(&format!("/admin/categories/{category_id}"), change)
            .await?;
        Ok(())
    }

    pub async fn delete_category(&self, category_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/admin/categories/{category_id}"))
            .await?;
        Ok(())
    }

    pub async fn tags(&self, filter: &TagFilter) -> Result<Page<AdminTag>, ApiError> {
        self.client.get_with("/admin/tags", filter).await
    }

    pub async fn update_tag(&self, tag_id: i64, change: &TagChange) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .patch_with(&format!("/admin/tags/{tag_id}"), change)
            .await?;
        Ok(())
    }

    pub async fn delete_tag(&self, tag_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/admin/tags/{tag_id}"))
            .await?;
        Ok(())
    }
}
