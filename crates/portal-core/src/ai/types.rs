use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

use crate::api::ApiError;

const MAX_PROMPT_CHARS: usize = 2000;
const MAX_CHAT_CHARS: usize = 10_000;
const MAX_IMAGES: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024*1024")]
    #[strum(to_string = "1024*1024", serialize = "square")]
    Square,
    #[serde(rename = "720*1280")]
    #[strum(to_string = "720*1280", serialize = "portrait")]
    Portrait,
    #[serde(rename = "1280*720")]
    #[strum(to_string = "1280*720", serialize = "landscape")]
    Landscape,
}

impl ImageSize {
    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Square => (1024, 1024),
            Self::Portrait => (720, 1280),
            Self::Landscape => (1280, 720),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text2ImageRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub size: ImageSize,
    #[serde(default = "default_image_count")]
    pub n: u8,
}

fn default_image_count() -> u8 {
    1
}

impl Text2ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            size: ImageSize::default(),
            n: default_image_count(),
        }
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_count(mut self, n: u8) -> Self {
        self.n = n;
        self
    }

    /// Reject requests the server would answer with a validation error.
    pub fn validate(&self) -> Result<(), ApiError> {
        let len = self.prompt.trim().chars().count();
        if len == 0 {
            return Err(ApiError::InvalidInput("prompt must not be empty".into()));
        }
        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ApiError::InvalidInput(format!(
                "prompt exceeds {MAX_PROMPT_CHARS} characters"
            )));
        }
        if let Some(negative) = &self.negative_prompt {
            if negative.chars().count() > MAX_PROMPT_CHARS {
                return Err(ApiError::InvalidInput(format!(
                    "negative prompt exceeds {MAX_PROMPT_CHARS} characters"
                )));
            }
        }
        if !(1..=MAX_IMAGES).contains(&self.n) {
            return Err(ApiError::InvalidInput(format!(
                "image count must be between 1 and {MAX_IMAGES}, got {}",
                self.n
            )));
        }
        Ok(())
    }
}

/// Returned by the submit call; identifies the job to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
}

/// One status read of a generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub results: Option<Vec<ImageResult>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskSnapshot {
    pub fn result_urls(&self) -> Vec<String> {
        self.results
            .iter()
            .flatten()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedImage {
    pub url: String,
    pub filename: String,
}

/// Client-side view of a generation job, as held by the AI store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub result_urls: Vec<String>,
    pub error: Option<String>,
}

impl From<&TaskHandle> for GenerationTask {
    fn from(handle: &TaskHandle) -> Self {
        Self {
            task_id: handle.task_id.clone(),
            status: handle.status,
            result_urls: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ChatMessage>>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: None,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = (!history.is_empty()).then_some(history);
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::InvalidInput("message must not be empty".into()));
        }
        if self.message.chars().count() > MAX_CHAT_CHARS {
            return Err(ApiError::InvalidInput(format!(
                "message exceeds {MAX_CHAT_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// Non-streaming chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}
