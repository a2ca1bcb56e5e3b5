use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tokio::sync::watch;

use crate::ai::{ChatMessage, ChatRole, GenerationTask, TaskHandle, TaskSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AiMode {
    #[default]
    Text2image,
    Chat,
}

/// AI tool state. Deliberately ephemeral: a conversation or a running job is
/// not durable content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AiState {
    pub is_modal_open: bool,
    pub mode: AiMode,
    pub chat_history: Vec<ChatMessage>,
    pub current_task: Option<GenerationTask>,
    pub is_generating: bool,
    pub is_streaming: bool,
}

#[derive(Clone)]
pub struct AiStore {
    tx: Arc<watch::Sender<AiState>>,
}

impl Default for AiStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AiStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AiState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> AiState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AiState> {
        self.tx.subscribe()
    }

    pub fn is_modal_open(&self) -> bool {
        self.tx.borrow().is_modal_open
    }

    pub fn mode(&self) -> AiMode {
        self.tx.borrow().mode
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.tx.borrow().chat_history.clone()
    }

    /// Open the tool, switching to `mode` when given and keeping the current
    /// mode otherwise.
    pub fn open_modal(&self, mode: Option<AiMode>) {
        self.tx.send_modify(|s| {
            s.is_modal_open = true;
            if let Some(mode) = mode {
                s.mode = mode;
            }
        });
    }

    pub fn close_modal(&self) {
        self.tx.send_modify(|s| s.is_modal_open = false);
    }

    pub fn set_mode(&self, mode: AiMode) {
        self.tx.send_modify(|s| s.mode = mode);
    }

    pub fn add_chat_message(&self, role: ChatRole, content: impl Into<String>) {
        let message = ChatMessage::new(role, content);
        self.tx.send_modify(|s| s.chat_history.push(message));
    }

    /// Replace the content of the trailing assistant message, or append one
    /// when the history does not end with an assistant turn.
    pub fn update_last_assistant_message(&self, content: impl Into<String>) {
        let content = content.into();
        self.tx.send_modify(|s| match s.chat_history.last_mut() {
            Some(last) if last.role == ChatRole::Assistant => last.content = content,
            _ => s.chat_history.push(ChatMessage::assistant(content)),
        });
    }

    pub fn clear_chat_history(&self) {
        self.tx.send_modify(|s| s.chat_history.clear());
    }

    pub fn set_streaming(&self, streaming: bool) {
        self.tx.send_modify(|s| s.is_streaming = streaming);
    }

    pub fn begin_task(&self, handle: &TaskHandle) {
        let task = GenerationTask::from(handle);
        self.tx.send_modify(|s| {
            s.current_task = Some(task);
            s.is_generating = true;
        });
    }

    /// Record a status read for the current task. Reads for any other task
    /// are ignored.
    pub fn record_snapshot(&self, snapshot: &TaskSnapshot) {
        self.tx.send_if_modified(|s| match s.current_task.as_mut() {
            Some(task) if task.task_id == snapshot.task_id => {
                task.status = snapshot.status;
                task.result_urls = snapshot.result_urls();
                task.error = snapshot.message.clone();
                true
            }
            _ => false,
        });
    }

    /// Mark the current job as no longer watched, keeping its last known state.
    pub fn finish_task(&self, error: Option<String>) {
        self.tx.send_modify(|s| {
            s.is_generating = false;
            if let (Some(task), Some(error)) = (s.current_task.as_mut(), error) {
                task.error = Some(error);
            }
        });
    }
}
