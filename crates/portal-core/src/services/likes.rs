use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TargetType;
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub target_type: TargetType,
    pub target_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    #[serde(default)]
    pub like_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCount {
    pub count: u64,
    #[serde(default)]
    pub liked: bool,
}

#[derive(Debug, Serialize)]
struct LikeCreate {
    target_type: TargetType,
    target_id: i64,
}

#[derive(Clone)]
pub struct LikeService {
    client: ApiClient,
}

impl LikeService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn like(&self, target_type: TargetType, target_id: i64) -> Result<Like, ApiError> {
        self.client
            .post(
                "/likes",
                &LikeCreate {
                    target_type,
                    target_id,
                },
            )
            .await
    }

    pub async fn delete(&self, like_id: i64) -> Result<(), ApiError> {
        let _: Value = self.client.delete(&format!("/likes/{like_id}")).await?;
        Ok(())
    }

    pub async fn unlike(&self, target_type: TargetType, target_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete(&format!("/likes/target/{target_type}/{target_id}"))
            .await?;
        Ok(())
    }

    pub async fn status(
        &self,
        target_type: TargetType,
        target_id: i64,
    ) -> Result<LikeStatus, ApiError> {
        self.client
            .get(&format!("/likes/status/{target_type}/{target_id}"))
            .await
    }

    pub async fn count(
        &self,
        target_type: TargetType,
        target_id: i64,
    ) -> Result<LikeCount, ApiError> {
        self.client
            .get(&format!("/likes/count/{target_type}/{target_id}"))
            .await
    }

    /// Flip the like state and return the new one.
    pub async fn toggle(
        &self,
        target_type: TargetType,
        target_id: i64,
        currently_liked: bool,
    ) -> Result<bool, ApiError> {
        if currently_liked {
            self.unlike(target_type, target_id).await?;
            Ok(false)
        } else {
            self.like(target_type, target_id).await?;
            Ok(true)
        }
    }
}
