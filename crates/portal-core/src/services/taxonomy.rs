use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub post_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetail {
    #[serde(flatten)]
    pub tag: Tag,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub post_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: String,
}

#[derive(Clone)]
pub struct TagService {
    client: ApiClient,
}

impl TagService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> Result<Vec<Tag>, ApiError> {
        self.client.get("/tags").await
    }

    pub async fn popular(&self, limit: u32) -> Result<Vec<Tag>, ApiError> {
        self.client
            .get_with("/tags/popular", &[("limit", limit)])
            .await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<TagDetail, ApiError> {
        self.client.get(&format!("/tags/{slug}")).await
    }
}

#[derive(Clone)]
pub struct CategoryService {
    client: ApiClient,
}

impl CategoryService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> Result<Vec<Category>, ApiError> {
        self.client.get("/categories").await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<CategoryDetail, ApiError> {
        self.client.get(&format!("/categories/{slug}")).await
    }
}
