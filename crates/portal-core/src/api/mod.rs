//! HTTP client for the platform's REST API.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! session's bearer token and runs the shared failure interception: a 401 on
//! an authenticated request expires the session once, and every other
//! failure is classified into an [`ApiError`] and reported to the
//! [`NoticeSink`].

pub mod error;
pub mod notice;

pub use error::ApiError;
pub use notice::{Notice, NoticeSink, TracingNoticeSink};

use reqwest::{Method, RequestBuilder, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::store::SessionStore;

struct Inner {
    config: ClientConfig,
    http: reqwest::Client,
    streaming: reqwest::Client,
    session: SessionStore,
    notices: Arc<dyn NoticeSink>,
}

/// Cheap to clone; clones share connection pools and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        Self::with_notice_sink(config, session, Arc::new(TracingNoticeSink))
    }

    pub fn with_notice_sink(
        config: ClientConfig,
        session: SessionStore,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        // Streams run for as long as the server keeps sending; only the
        // connect phase is bounded.
        let streaming = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                streaming,
                session,
                notices,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn notify(&self, notice: Notice) {
        self.inner.notices.notify(notice);
    }

    /// Start a request against an API path on the short-timeout client.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.inner.config.endpoint(path))
    }

    /// Start a request on the client without a total timeout, for responses
    /// that are consumed incrementally.
    pub fn streaming_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .streaming
            .request(method, self.inner.config.endpoint(path))
    }

    /// Attach the current token, send, and run the failure interception.
    /// Returns the response only when its status is a success.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.inner.session.token();
        let builder = match &token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(target: "portal::api", error = %e, "Request failed before a response");
                let err = ApiError::Network(e);
                self.report(&err);
                return Err(err);
            }
        };

        let status = response.status();
        debug!(
            target: "portal::api",
            path = %response.url().path(),
            status = status.as_u16(),
            "Response received"
        );
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);

        match (&err, token) {
            (ApiError::Unauthorized { .. }, Some(token)) => {
                if self.inner.session.expire(&token) {
                    warn!(target: "portal::api", "Server rejected the session token");
                    self.notify(Notice::SessionExpired);
                }
            }
            _ => self.report(&err),
        }
        Err(err)
    }

    /// Execute and decode a JSON body. An empty body decodes as JSON `null`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(builder).await?;
        let endpoint = response.url().path().to_string();
        let body = response.text().await.map_err(|e| {
            let err = ApiError::Network(e);
            self.report(&err);
            err
        })?;
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(|e| {
            let err = ApiError::Decode {
                endpoint,
                details: e.to_string(),
            };
            self.report(&err);
            err
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::GET, path).query(query))
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::POST, path).json(body))
            .await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::POST, path)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::PUT, path).json(body))
            .await
    }

    /// PATCH with parameters carried in the query string.
    pub async fn patch_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::PATCH, path).query(query))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::DELETE, path)).await
    }

    pub async fn delete_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::DELETE, path).query(query))
            .await
    }

    /// Send a multipart form with `method`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(method, path).multipart(form))
            .await
    }

    fn report(&self, err: &ApiError) {
        if let Some(notice) = err.notice() {
            self.notify(notice);
        }
    }
}
