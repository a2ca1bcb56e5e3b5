//! Real-time notification channel.
//!
//! While a session holds a token, [`PushClient::run`] keeps a WebSocket open
//! to the server's notification endpoint, applies inbound counters to the
//! [`NotificationStore`] and republishes every event on a broadcast channel.

pub mod event;

pub use event::{PushEvent, UnreadCounts};

use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::store::{NotificationStore, SessionStore};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);
/// Floor applied to `ping_interval`; a zero period is not a valid timer.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(10);
const PING: &str = "ping";
const PONG: &str = "pong";
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct PushOptions {
    pub reconnect_delay: Duration,
    pub ping_interval: Duration,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    /// No token; waiting for a login.
    Idle,
    Connecting,
    Open,
    /// The socket is shutting down.
    Draining,
    /// Disconnected; a reconnect follows unless the client was stopped.
    Closed,
}

enum SessionEnd {
    Cancelled,
    Dropped,
    TokenChanged,
}

#[derive(Clone)]
pub struct PushClient {
    config: ClientConfig,
    session: SessionStore,
    notifications: NotificationStore,
    events: broadcast::Sender<PushEvent>,
    state: Arc<watch::Sender<PushState>>,
}

impl PushClient {
    pub fn new(
        config: ClientConfig,
        session: SessionStore,
        notifications: NotificationStore,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (state, _) = watch::channel(PushState::Idle);
        Self {
            config,
            session,
            notifications,
            events,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> PushState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PushState> {
        self.state.subscribe()
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    /// Connect, reconnect and dispatch until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut session_rx = self.session.subscribe();

        loop {
            let Some(token) = self.session.token() else {
                self.set_state(PushState::Idle);
                debug!(target: "portal::push", "No session token, waiting for login");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(()),
                    res = session_rx.wait_for(|s| s.token.is_some()) => {
                        if res.is_err() {
                            return Ok(());
                        }
                    }
                }
                continue;
            };

            let url = self.config.push_url(&token)?;
            self.set_state(PushState::Connecting);
            debug!(target: "portal::push", host = ?url.host_str(), "Connecting push channel");

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.set_state(PushState::Closed);
                    return Ok(());
                }
                res = tokio_tungstenite::connect_async(url.as_str()) => res,
            };

            let end = match connected {
                Ok((socket, _response)) => {
                    info!(target: "portal::push", "Push channel connected");
                    self.set_state(PushState::Open);
                    self.notifications.set_connected(true);
                    let end = self
                        .pump(socket, &token, &mut session_rx, &cancel)
                        .await;
                    self.notifications.set_connected(false);
                    end
                }
                Err(e) => {
                    warn!(target: "portal::push", error = %e, "Push channel connection failed");
                    self.notifications.set_connected(false);
                    SessionEnd::Dropped
                }
            };
            self.set_state(PushState::Closed);

            match end {
                SessionEnd::Cancelled => return Ok(()),
                SessionEnd::TokenChanged => continue,
                SessionEnd::Dropped => {
                    info!(
                        target: "portal::push",
                        delay_secs = self.config.push.reconnect_delay.as_secs(),
                        "Push channel disconnected, reconnecting"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(()),
                        () = tokio::time::sleep(self.config.push.reconnect_delay) => {}
                    }
                }
            }
        }
    }

    async fn pump<S>(
        &self,
        socket: tokio_tungstenite::WebSocketStream<S>,
        token: &str,
        session_rx: &mut watch::Receiver<crate::store::SessionState>,
        cancel: &CancellationToken,
    ) -> SessionEnd
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut sink, mut stream) = socket.split();
        let period = self.config.push.ping_interval.max(MIN_PING_INTERVAL);
        let mut ping = tokio::time::interval_at(Instant::now() + period, period);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let end = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break SessionEnd::Cancelled,
                res = session_rx.changed() => {
                    if res.is_err() || self.session.token().as_deref() != Some(token) {
                        debug!(target: "portal::push", "Session changed, dropping push channel");
                        break SessionEnd::TokenChanged;
                    }
                }
                _ = ping.tick() => {
                    if let Err(e) = sink.send(Message::Text(PING.into())).await {
                        warn!(target: "portal::push", error = %e, "Failed to send ping");
                        break SessionEnd::Dropped;
                    }
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(Message::Binary(bytes))) => self.dispatch(&String::from_utf8_lossy(&bytes)),
                    Some(Ok(Message::Close(_))) | None => break SessionEnd::Dropped,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(target: "portal::push", error = %e, "Push channel read failed");
                        break SessionEnd::Dropped;
                    }
                },
            }
        };

        self.set_state(PushState::Draining);
        if !matches!(end, SessionEnd::Dropped) {
            let _ = sink.send(Message::Close(None)).await;
        }
        end
    }

    /// Apply one inbound text frame.
    pub fn dispatch(&self, text: &str) {
        if text.trim() == PONG {
            return;
        }

        let event = match PushEvent::parse(text) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(target: "portal::push", frame = %text, "Ignoring unknown push message");
                return;
            }
            Err(e) => {
                warn!(target: "portal::push", error = %e, "Failed to parse push message");
                return;
            }
        };

        match &event {
            PushEvent::Notification(_) => self.notifications.increment_notifications(),
            PushEvent::Message(_) => self.notifications.increment_messages(),
            PushEvent::UnreadCount(counts) => {
                self.notifications
                    .set_unread_notifications(counts.notifications);
                self.notifications.set_unread_messages(counts.messages);
            }
            PushEvent::Connected(data) => {
                info!(target: "portal::push", %data, "Push channel authenticated");
            }
        }

        // No subscribers is fine; the counters are already applied.
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: PushState) {
        self.state.send_if_modified(|s| {
            if *s == state {
                false
            } else {
                *s = state;
                true
            }
        });
    }
}
