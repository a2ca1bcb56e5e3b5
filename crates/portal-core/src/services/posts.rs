use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::taxonomy::{Category, Tag};
use super::{Page, UserBrief};
use crate::api::{ApiClient, ApiError};
use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub title_en: Option<String>,
    pub slug: String,
    pub content: Document,
    #[serde(default)]
    pub content_en: Option<Document>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub status: PostStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub published_at: Option<String>,
    pub user: UserBrief,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostListItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub title_en: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub status: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub created_at: String,
    #[serde(default)]
    pub published_at: Option<String>,
    pub user: UserBrief,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    pub content: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_en: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl PostCreate {
    pub fn new(title: impl Into<String>, content: Document) -> Self {
        Self {
            title: title.into(),
            title_en: None,
            content,
            content_en: None,
            excerpt: None,
            cover_image: None,
            category_id: None,
            tag_ids: Vec::new(),
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_en: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostSort {
    CreatedAt,
    UpdatedAt,
    ViewCount,
    LikeCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Listing and search filters. Unset fields are left to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<PostSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MyPostsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Clone)]
pub struct PostService {
    client: ApiClient,
}

impl PostService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PostQuery) -> Result<Page<PostListItem>, ApiError> {
        self.client.get_with("/posts", query).await
    }

    pub async fn featured(&self, limit: u32) -> Result<Vec<PostListItem>, ApiError> {
        self.client
            .get_with("/posts/featured", &[("limit", limit)])
            .await
    }

    pub async fn mine(&self, query: &MyPostsQuery) -> Result<Page<PostListItem>, ApiError> {
        self.client.get_with("/posts/my", query).await
    }

    pub async fn get(&self, id: i64) -> Result<Post, ApiError> {
        self.client.get(&format!("/posts/{id}")).await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Post, ApiError> {
        self.client.get(&format!("/posts/slug/{slug}")).await
    }

    pub async fn create(&self, post: &PostCreate) -> Result<Post, ApiError> {
        self.client.post("/posts", post).await
    }

    pub async fn update(&self, id: i64, update: &PostUpdate) -> Result<Post, ApiError> {
        self.client.put(&format!("/posts/{id}"), update).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let _: Value = self.client.delete(&format!("/posts/{id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_serializes_only_set_filters() {
        let query = PostQuery {
            q: Some("rust".into()),
            sort_by: Some(PostSort::LikeCount),
            sort_order: Some(SortOrder::Desc),
            ..PostQuery::default()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"q": "rust", "sort_by": "like_count", "sort_order": "desc"})
        );
    }

    #[test]
    fn post_parses_with_document_body() {
        let post: Post = serde_json::from_value(json!({
            "id": 3,
            "title": "Hello",
            "title_en": null,
            "slug": "hello",
            "content": {"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Body"}]}
            ]},
            "content_en": null,
            "excerpt": null,
            "cover_image": null,
            "status": "published",
            "is_featured": false,
            "view_count": 10,
            "like_count": 2,
            "comment_count": 0,
            "created_at": "2024-05-01T10:00:00",
            "updated_at": "2024-05-01T10:00:00",
            "published_at": "2024-05-01T10:00:00",
            "user": {"id": 1, "username": "lin", "nickname": null, "avatar": null},
            "category": {"id": 2, "name": "技术", "name_en": "Tech", "slug": "tech", "icon": null},
            "tags": [{"id": 4, "name": "rust", "name_en": null, "slug": "rust"}]
        }))
        .unwrap();
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.content.plain_text(), "Body");
        assert_eq!(post.category.unwrap().slug, "tech");
        assert_eq!(post.tags.len(), 1);
    }

    #[test]
    fn create_omits_unset_fields() {
        let create = PostCreate::new("T", Document::from_plain_text("x"));
        let value = serde_json::to_value(&create).unwrap();
        assert_eq!(value["title"], "T");
        assert!(value.get("tag_ids").is_none());
        assert!(value.get("status").is_none());
    }
}
