use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{AiError, TaskId, TaskSnapshot};
use crate::api::ApiError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Anything that can report the current state of a long-running task.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ApiError>;
}

/// Read the status of `task_id` until it is terminal.
///
/// Reads are issued `options.interval` apart, at most `options.max_attempts`
/// times, and `on_progress` sees every snapshot. A FAILED status ends the
/// wait like SUCCEEDED does; inspecting it is the caller's business.
/// Read errors abort the loop immediately.
pub async fn poll_until_complete<S, F>(
    source: &S,
    task_id: &TaskId,
    mut on_progress: F,
    options: &PollOptions,
    cancel: &CancellationToken,
) -> Result<TaskSnapshot, AiError>
where
    S: TaskStatusSource + ?Sized,
    F: FnMut(&TaskSnapshot) + Send,
{
    let mut last_status = None;

    for attempt in 1..=options.max_attempts {
        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(target: "portal::ai::polling", %task_id, attempt, "Polling cancelled");
                return Err(AiError::Cancelled);
            }
            res = source.task_status(task_id) => res?,
        };

        debug!(
            target: "portal::ai::polling",
            %task_id,
            attempt,
            status = %snapshot.status,
            "Task status read"
        );
        on_progress(&snapshot);

        if snapshot.status.is_terminal() {
            return Ok(snapshot);
        }
        last_status = Some(snapshot.status);

        if attempt < options.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AiError::Cancelled),
                _ = tokio::time::sleep(options.interval) => {}
            }
        }
    }

    Err(AiError::PollingTimeout {
        task_id: task_id.clone(),
        attempts: options.max_attempts,
        last_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ImageResult, TaskStatus};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct Scripted {
        statuses: Mutex<VecDeque<TaskStatus>>,
        fallback: TaskStatus,
        reads: AtomicU32,
    }

    impl Scripted {
        fn new(statuses: &[TaskStatus], fallback: TaskStatus) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                fallback,
                reads: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskStatusSource for Scripted {
        async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ApiError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);
            let results = (status == TaskStatus::Succeeded).then(|| {
                vec![
                    ImageResult {
                        url: "https://img/1.png".into(),
                    },
                    ImageResult {
                        url: "https://img/2.png".into(),
                    },
                ]
            });
            Ok(TaskSnapshot {
                task_id: task_id.clone(),
                status,
                results,
                message: None,
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl TaskStatusSource for Broken {
        async fn task_status(&self, _task_id: &TaskId) -> Result<TaskSnapshot, ApiError> {
            Err(ApiError::Server {
                status: 502,
                detail: "bad gateway".into(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_after_three_reads() {
        let source = Scripted::new(
            &[TaskStatus::Pending, TaskStatus::Running, TaskStatus::Succeeded],
            TaskStatus::Running,
        );
        let mut seen = Vec::new();
        let started = Instant::now();

        let snapshot = poll_until_complete(
            &source,
            &TaskId::from("t-1"),
            |s| seen.push(s.status),
            &PollOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(snapshot.status, TaskStatus::Succeeded);
        assert_eq!(
            snapshot.result_urls(),
            vec!["https://img/1.png", "https://img/2.png"]
        );
        assert_eq!(
            seen,
            vec![TaskStatus::Pending, TaskStatus::Running, TaskStatus::Succeeded]
        );
        assert_eq!(source.reads.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_exactly_max_attempts() {
        let source = Scripted::new(&[], TaskStatus::Running);
        let options = PollOptions {
            interval: Duration::from_millis(100),
            max_attempts: 5,
        };
        let started = Instant::now();

        let err = poll_until_complete(
            &source,
            &TaskId::from("slow"),
            |_| {},
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            AiError::PollingTimeout {
                task_id,
                attempts,
                last_status,
            } => {
                assert_eq!(task_id, TaskId::from("slow"));
                assert_eq!(attempts, 5);
                assert_eq!(last_status, Some(TaskStatus::Running));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(source.reads.load(Ordering::SeqCst), 5);
        // Four waits between five reads, none after the last.
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_ends_the_wait() {
        let source = Scripted::new(&[TaskStatus::Pending, TaskStatus::Failed], TaskStatus::Running);
        let snapshot = poll_until_complete(
            &source,
            &TaskId::from("t-2"),
            |_| {},
            &PollOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn read_errors_abort_immediately() {
        let err = poll_until_complete(
            &Broken,
            &TaskId::from("t-3"),
            |_| {},
            &PollOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AiError::Api(ApiError::Server { status: 502, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let source = Scripted::new(&[], TaskStatus::Pending);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(4500)).await;
            trigger.cancel();
        });

        let err = poll_until_complete(
            &source,
            &TaskId::from("t-4"),
            |_| {},
            &PollOptions::default(),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AiError::Cancelled));
        assert_eq!(source.reads.load(Ordering::SeqCst), 3);
    }
}
