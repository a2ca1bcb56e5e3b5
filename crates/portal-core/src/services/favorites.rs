use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Page, PageQuery};
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritePost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub post: Option<FavoritePost>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub favorited: bool,
    #[serde(default)]
    pub favorite_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct FavoriteCreate<'a> {
    post_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct FavoriteUpdate<'a> {
    note: Option<&'a str>,
}

#[derive(Clone)]
pub struct FavoriteService {
    client: ApiClient,
}

impl FavoriteService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn mine(&self, page: PageQuery) -> Result<Page<Favorite>, ApiError> {
        self.client.get_with("/favorites", &page).await
    }

    pub async fn create(&self, post_id: i64, note: Option<&str>) -> Result<Favorite, ApiError> {
        self.client
            .post("/favorites", &FavoriteCreate { post_id, note })
            .await
    }

    pub async fn update_note(
        &self,
        favorite_id: i64,
        note: Option<&str>,
    ) -> Result<Favorite, ApiError> {
        self.client
            .put(&format!("/favorites/{favorite_id}"), &FavoriteUpdate { note })
            .await
    }

    pub async fn delete(&self, favorite_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/favorites/{favorite_id}"))
            .await?;
        Ok(())
    }

    pub async fn unfavorite_post(&self, post_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/favorites/post/{post_id}"))
            .await?;
        Ok(())
    }

    pub async fn status(&self, post_id: i64) -> Result<FavoriteStatus, ApiError> {
        self.client
            .get(&format!("/favorites/status/{post_id}"))
            .await
    }

    /// Flip the favorite state and return the new one.
    pub async fn toggle(&self, post_id: i64, currently_favorited: bool) -> Result<bool, ApiError> {
        if currently_favorited {
            self.unfavorite_post(post_id).await?;
            Ok(false)
        } else {
            self.create(post_id, None).await?;
            Ok(true)
        }
    }
}
