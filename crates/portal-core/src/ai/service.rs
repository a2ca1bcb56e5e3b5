use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Method, header};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::polling::{TaskStatusSource, poll_until_complete};
use super::stream::{
    ChatEventStream, ChatStreamEvent, ChatStreamHandler, StateTx, StreamHandle, StreamState,
    decode_events_with_state,
};
use super::{
    AiError, ChatReply, ChatRequest, SavedImage, TaskHandle, TaskId, TaskSnapshot, TaskStatus,
    Text2ImageRequest,
};
use crate::api::{ApiClient, ApiError};

const GENERATION_FAILED: &str = "Image generation failed";

#[derive(Clone)]
pub struct AiService {
    client: ApiClient,
}

impl AiService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn submit_text2image(
        &self,
        request: &Text2ImageRequest,
    ) -> Result<TaskHandle, AiError> {
        request.validate()?;
        let handle: TaskHandle = self.client.post("/ai/text2image", request).await?;
        info!(target: "portal::ai", task_id = %handle.task_id, "Generation task submitted");
        Ok(handle)
    }

    pub async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ApiError> {
        self.client
            .get(&format!("/ai/text2image/{task_id}"))
            .await
    }

    /// Wait for `task_id` using the configured interval and attempt ceiling.
    pub async fn poll_task_until_complete<F>(
        &self,
        task_id: &TaskId,
        on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<TaskSnapshot, AiError>
    where
        F: FnMut(&TaskSnapshot) + Send,
    {
        poll_until_complete(
            self,
            task_id,
            on_progress,
            &self.client.config().poll,
            cancel,
        )
        .await
    }

    /// Submit a generation request and wait for its images. A FAILED task
    /// becomes [`AiError::GenerationFailed`].
    pub async fn generate_images<F>(
        &self,
        request: &Text2ImageRequest,
        on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<TaskSnapshot, AiError>
    where
        F: FnMut(&TaskSnapshot) + Send,
    {
        let handle = self.submit_text2image(request).await?;
        let snapshot = self
            .poll_task_until_complete(&handle.task_id, on_progress, cancel)
            .await?;

        if snapshot.status == TaskStatus::Failed {
            return Err(AiError::GenerationFailed {
                task_id: snapshot.task_id,
                message: snapshot
                    .message
                    .unwrap_or_else(|| GENERATION_FAILED.to_string()),
            });
        }
        Ok(snapshot)
    }

    /// Ask the server to keep a copy of a generated image in its uploads.
    pub async fn save_image(&self, url: &str) -> Result<SavedImage, AiError> {
        let saved: SavedImage = self
            .client
            .post("/ai/text2image/save", &json!({ "url": url }))
            .await?;
        Ok(saved)
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, AiError> {
        request.validate()?;
        Ok(self.client.post("/ai/chat/sync", request).await?)
    }

    /// Pull-based chat stream. Ends silently when `cancel` fires; otherwise
    /// the last item is `Done` or `Error`.
    pub fn chat_stream(&self, request: ChatRequest, cancel: CancellationToken) -> ChatEventStream {
        let (tx, _rx) = watch::channel(StreamState::Connecting);
        self.open_stream(request, cancel, Arc::new(tx))
    }

    /// Stream a chat reply and return the concatenated text.
    pub async fn collect_reply(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<String, AiError> {
        let mut events = self.chat_stream(request, cancel);
        let mut reply = String::new();
        while let Some(event) = events.next().await {
            match event {
                ChatStreamEvent::Chunk(text) => reply.push_str(&text),
                ChatStreamEvent::Done => return Ok(reply),
                ChatStreamEvent::Error(message) => {
                    return Err(AiError::StreamUpstream { message });
                }
            }
        }
        Err(AiError::Cancelled)
    }

    /// Stream a chat reply into `handler` on a background task.
    pub fn start_stream<H>(&self, request: ChatRequest, handler: H) -> StreamHandle
    where
        H: ChatStreamHandler,
    {
        let cancel = CancellationToken::new();
        let (tx, _rx) = watch::channel(StreamState::Connecting);
        let state = Arc::new(tx);
        let events = self.open_stream(request, cancel.clone(), state.clone());
        StreamHandle::spawn(events, handler, cancel, state)
    }

    fn open_stream(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
        state: StateTx,
    ) -> ChatEventStream {
        let client = self.client.clone();

        Box::pin(async_stream::stream! {
            if let Err(e) = request.validate() {
                yield ChatStreamEvent::Error(e.to_string());
                return;
            }

            let builder = client
                .streaming_request(Method::POST, "/ai/chat")
                .header(header::ACCEPT, "text/event-stream")
                .json(&request);

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(target: "portal::ai::stream", "Cancelled before the stream opened");
                    return;
                }
                res = client.execute(builder) => res,
            };

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    let message = match e.status() {
                        Some(status) => format!("HTTP {status}"),
                        None => e.to_string(),
                    };
                    yield ChatStreamEvent::Error(message);
                    return;
                }
            };

            state.send_replace(StreamState::Open);
            debug!(target: "portal::ai::stream", "Chat stream open");

            let mut events = decode_events_with_state(response.bytes_stream(), cancel, state);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }
}

#[async_trait]
impl TaskStatusSource for AiService {
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ApiError> {
        AiService::task_status(self, task_id).await
    }
}
