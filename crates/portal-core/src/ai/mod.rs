//! Image generation and chat against the platform's AI endpoints.

pub mod polling;
pub mod service;
pub mod stream;
pub mod types;

pub use polling::{PollOptions, TaskStatusSource, poll_until_complete};
pub use service::AiService;
pub use stream::{
    Callbacks, ChatEventStream, ChatStreamEvent, ChatStreamHandler, CloseReason, LineDecoder,
    StreamHandle, StreamLine, StreamState, callbacks, decode_events, parse_line,
};
pub use types::*;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum AiError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Task {task_id} did not finish after {attempts} status checks")]
    PollingTimeout {
        task_id: TaskId,
        attempts: u32,
        last_status: Option<TaskStatus>,
    },

    #[error("Task {task_id} failed: {message}")]
    GenerationFailed { task_id: TaskId, message: String },

    #[error("Upstream error: {message}")]
    StreamUpstream { message: String },

    #[error("Operation cancelled")]
    Cancelled,
}
