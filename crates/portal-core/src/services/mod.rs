//! Typed wrappers over [`ApiClient`], one per resource family.

pub mod admin;
pub mod auth;
pub mod comments;
pub mod favorites;
pub mod likes;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod taxonomy;
pub mod uploads;

pub use admin::AdminService;
pub use auth::AuthService;
pub use comments::CommentService;
pub use favorites::FavoriteService;
pub use likes::LikeService;
pub use messages::MessageService;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use taxonomy::{CategoryService, TagService};
pub use uploads::UploadService;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::ai::AiService;
use crate::api::ApiClient;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
}

impl PageQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

/// Compact user reference embedded in posts, comments and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBrief {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserBrief {
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

/// Every resource service sharing one client.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub posts: PostService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub favorites: FavoriteService,
    pub notifications: NotificationService,
    pub messages: MessageService,
    pub tags: TagService,
    pub categories: CategoryService,
    pub uploads: UploadService,
    pub admin: AdminService,
    pub ai: AiService,
}

impl Services {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            posts: PostService::new(client.clone()),
            comments: CommentService::new(client.clone()),
            likes: LikeService::new(client.clone()),
            favorites: FavoriteService::new(client.clone()),
            notifications: NotificationService::new(client.clone()),
            messages: MessageService::new(client.clone()),
            tags: TagService::new(client.clone()),
            categories: CategoryService::new(client.clone()),
            uploads: UploadService::new(client.clone()),
            admin: AdminService::new(client.clone()),
            ai: AiService::new(client.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_parses_listing_envelope() {
        let page: Page<UserBrief> = serde_json::from_value(json!({
            "items": [{"id": 1, "username": "lin", "nickname": "Lin", "avatar": null}],
            "total": 41,
            "page": 2,
            "size": 20,
            "pages": 3
        }))
        .unwrap();
        assert_eq!(page.items[0].display_name(), "Lin");
        assert!(page.has_next());
    }

    #[test]
    fn target_type_uses_path_names() {
        assert_eq!(TargetType::Comment.to_string(), "comment");
        assert_eq!(serde_json::to_value(TargetType::Post).unwrap(), json!("post"));
    }
}
