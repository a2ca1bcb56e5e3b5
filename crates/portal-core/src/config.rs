use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::ai::PollOptions;
use crate::error::{Error, Result};
use crate::push::PushOptions;
use crate::utils::paths::AppPaths;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PUSH_PATH: &str = "/ws/notifications";

pub const ENV_API_BASE_URL: &str = "PORTAL_API_BASE_URL";
pub const ENV_WS_URL: &str = "PORTAL_WS_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PORTAL_REQUEST_TIMEOUT_SECS";

/// Resolved client configuration.
///
/// Layering, lowest to highest precedence: built-in defaults, the user's
/// `config.toml`, then `PORTAL_*` environment variables (a `.env` file is
/// honoured).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: Url,
    /// Explicit push endpoint. Derived from `api_base_url` when unset.
    pub ws_url: Option<Url>,
    pub request_timeout: Duration,
    pub poll: PollOptions,
    pub push: PushOptions,
}

/// On-disk shape of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_base_url: Option<String>,
    pub ws_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    pub reconnect_delay_secs: Option<u64>,
    pub ping_interval_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            ws_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll: PollOptions::default(),
            push: PushOptions::default(),
        }
    }
}

#[expect(clippy::expect_used)]
static DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(DEFAULT_API_BASE_URL).expect("DEFAULT_API_BASE_URL is a valid URL")
});

fn default_base_url() -> Url {
    DEFAULT_BASE_URL.clone()
}

impl ClientConfig {
    /// Build a config pointing at `base_url` with every other setting defaulted.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            api_base_url: parse_url(base_url)?,
            ..Self::default()
        })
    }

    /// Load the full layered configuration for the current user.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(path) = AppPaths::user_config_file() {
            if path.exists() {
                config.apply_file(&ConfigFile::read(&path)?)?;
            }
        }
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: &ConfigFile) -> Result<()> {
        if let Some(base) = &file.api_base_url {
            self.api_base_url = parse_url(base)?;
        }
        if let Some(ws) = &file.ws_url {
            self.ws_url = Some(parse_url(ws)?);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.poll_interval_ms {
            self.poll.interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = file.poll_max_attempts {
            self.poll.max_attempts = attempts;
        }
        if let Some(secs) = file.reconnect_delay_secs {
            self.push.reconnect_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = file.ping_interval_secs {
            if secs == 0 {
                return Err(Error::Configuration(
                    "ping_interval_secs must be at least 1".to_string(),
                ));
            }
            self.push.ping_interval = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Apply environment overrides using `lookup` as the variable source.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = parse_url(&base)?;
        }
        if let Some(ws) = lookup(ENV_WS_URL) {
            self.ws_url = Some(parse_url(&ws)?);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                Error::Configuration(format!("{ENV_REQUEST_TIMEOUT_SECS}={raw:?} is not a number: {e}"))
            })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Absolute URL for an API path such as `/posts/12`.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Push channel URL carrying `token` as a query parameter.
    pub fn push_url(&self, token: &str) -> Result<Url> {
        let mut url = match &self.ws_url {
            Some(url) => url.clone(),
            None => {
                let mut url = self.api_base_url.clone();
                let scheme = match url.scheme() {
                    "https" => "wss",
                    _ => "ws",
                };
                url.set_scheme(scheme).map_err(|()| {
                    Error::Configuration(format!(
                        "Cannot derive a WebSocket URL from {}",
                        self.api_base_url
                    ))
                })?;
                url.set_path(PUSH_PATH);
                url.set_query(None);
                url
            }
        };
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| Error::Configuration(format!("Invalid URL {raw:?}: {e}")))
}
