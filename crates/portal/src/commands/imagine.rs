use async_trait::async_trait;
use eyre::Result;
use portal_core::AppState;
use portal_core::ai::{AiError, ImageSize, TaskSnapshot, TaskStatus, Text2ImageRequest};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Command, interrupted};

pub struct ImagineCommand {
    pub prompt: String,
    pub negative: Option<String>,
    pub size: ImageSize,
    pub count: u8,
    pub save: bool,
}

impl ImagineCommand {
    fn request(&self) -> Text2ImageRequest {
        let mut request = Text2ImageRequest::new(self.prompt.clone())
            .with_size(self.size)
            .with_count(self.count);
        if let Some(negative) = self.negative.as_deref().filter(|n| !n.trim().is_empty()) {
            request = request.with_negative_prompt(negative);
        }
        request
    }
}

#[async_trait]
impl Command for ImagineCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let ai = state.services()?.ai;
        let request = self.request();
        request.validate()?;

        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            interrupted().await;
            watcher.cancel();
        });

        let mut stderr = std::io::stderr();
        let mut last = None;
        let on_progress = |snapshot: &TaskSnapshot| {
            if last != Some(snapshot.status) {
                last = Some(snapshot.status);
                let _ = writeln!(stderr, "{}: {}", snapshot.task_id, progress_label(snapshot.status));
            }
        };

        let (width, height) = self.size.dimensions();
        let mut stdout = std::io::stdout();
        writeln!(stdout, "Generating {} image(s) at {width}x{height}…", self.count)?;

        let result = ai.generate_images(&request, on_progress, &cancel).await;
        ctrl_c.abort();

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(AiError::Cancelled) => {
                writeln!(stdout, "Cancelled")?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for url in snapshot.result_urls() {
            if self.save {
                let saved = ai.save_image(&url).await?;
                debug!(target: "portal::imagine", from = %url, to = %saved.url, "Saved generated image");
                writeln!(stdout, "{}", saved.url)?;
            } else {
                writeln!(stdout, "{url}")?;
            }
        }
        Ok(())
    }
}

fn progress_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "queued",
        TaskStatus::Running => "generating",
        TaskStatus::Succeeded => "done",
        TaskStatus::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_negative_prompt_is_dropped() {
        let command = ImagineCommand {
            prompt: "harbour at night".into(),
            negative: Some(" ".into()),
            size: ImageSize::Landscape,
            count: 2,
            save: false,
        };
        let request = command.request();
        assert_eq!(request.negative_prompt, None);
        assert_eq!(request.size, ImageSize::Landscape);
        assert_eq!(request.n, 2);
    }
}
