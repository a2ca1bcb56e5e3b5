use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};
use crate::store::User;

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_preference: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// Account operations. Keeps the [`SessionStore`](crate::store::SessionStore)
/// behind the client in step with the server.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.client.post("/auth/register", request).await
    }

    /// Exchange credentials for a token, load the profile and establish the
    /// session. A failed profile load leaves the session cleared.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let token: TokenResponse = self
            .client
            .post("/auth/login/json", &LoginRequest { username, password })
            .await?;

        let session = self.client.session();
        session.set_token(Some(token.access_token.clone()));

        match self.current_user().await {
            Ok(user) => {
                info!(target: "portal::auth", user = %user.username, "Logged in");
                session.login(user.clone(), token.access_token);
                Ok(user)
            }
            Err(e) => {
                session.logout();
                Err(e)
            }
        }
    }

    /// Tell the server, then clear the local session whatever it answered.
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_empty::<Value>("/auth/logout").await {
            debug!(target: "portal::auth", error = %e, "Server-side logout failed");
        }
        self.client.session().logout();
    }

    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        let token: TokenResponse = self.client.post_empty("/auth/refresh").await?;
        self.client
            .session()
            .set_token(Some(token.access_token.clone()));
        Ok(token.access_token)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get("/users/me").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.client.put("/users/me", update).await?;
        self.replace_session_user(&user);
        Ok(user)
    }

    pub async fn update_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<User, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(super::uploads::image_mime(file_name))?;
        let form = Form::new().part("file", part);
        let user: User = self
            .client
            .upload(Method::PUT, "/users/me/avatar", form)
            .await?;
        self.replace_session_user(&user);
        Ok(user)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .put(
                "/users/me/password",
                &PasswordChange {
                    current_password: current,
                    new_password: new,
                },
            )
            .await?;
        Ok(())
    }

    /// Start-up check: with a persisted token, reload the profile and
    /// re-establish the session. Returns whether the user is logged in.
    pub async fn check_auth(&self) -> bool {
        let session = self.client.session();
        let Some(token) = session.token() else {
            return false;
        };

        session.set_loading(true);
        match self.current_user().await {
            Ok(user) => {
                session.login(user, token);
                true
            }
            Err(e) => {
                debug!(target: "portal::auth", error = %e, "Persisted session is no longer valid");
                session.logout();
                false
            }
        }
    }

    fn replace_session_user(&self, user: &User) {
        self.client.session().update_user(|current| *current = user.clone());
    }
}
