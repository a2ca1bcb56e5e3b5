//! Line-delimited chat streaming.
//!
//! The chat endpoint answers with a body of `data: <payload>` lines. A
//! payload of `[DONE]` ends the stream, `[ERROR] <message>` reports an
//! upstream failure and anything else is a text chunk. Every other line is
//! ignored.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";
const ERROR_SENTINEL: &str = "[ERROR]";

/// Classified line of a chat stream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    Chunk(String),
    Done,
    Error(String),
    Ignored,
}

pub fn parse_line(line: &str) -> StreamLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return StreamLine::Ignored;
    };
    if payload == DONE_SENTINEL {
        return StreamLine::Done;
    }
    if let Some(rest) = payload.strip_prefix(ERROR_SENTINEL) {
        let message = rest.strip_prefix(' ').unwrap_or(rest);
        return StreamLine::Error(message.to_string());
    }
    StreamLine::Chunk(payload.to_string())
}

/// Splits a byte stream into lines.
///
/// Splitting happens on raw bytes, so a multi-byte character cut in half by
/// a network chunk is only decoded once its line is complete.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Return the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Event delivered to consumers of a chat stream. `Done` and `Error` are
/// always the last item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    Chunk(String),
    Error(String),
    Done,
}

pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    Failed,
    Aborted,
}

/// Lifecycle of one streamed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Open,
    /// The transport ended; the buffered remainder is being parsed.
    Draining,
    Closed(CloseReason),
}

impl StreamState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

pub(crate) type StateTx = Arc<watch::Sender<StreamState>>;

/// Turn a response body into chat events.
///
/// Ends without a terminal event when `cancel` fires. A transport that ends
/// without a sentinel completes normally.
pub fn decode_events<S, E>(body: S, cancel: CancellationToken) -> ChatEventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (tx, _rx) = watch::channel(StreamState::Open);
    decode_events_with_state(body, cancel, Arc::new(tx))
}

pub(crate) fn decode_events_with_state<S, E>(
    body: S,
    cancel: CancellationToken,
    state: StateTx,
) -> ChatEventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = Box::pin(body);
        let mut decoder = LineDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(target: "portal::ai::stream", "Stream cancelled");
                    return;
                }
                next = body.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for line in decoder.push(&bytes) {
                        match parse_line(&line) {
                            StreamLine::Chunk(text) => { yield ChatStreamEvent::Chunk(text); }
                            StreamLine::Done => {
                                yield ChatStreamEvent::Done;
                                return;
                            }
                            StreamLine::Error(message) => {
                                warn!(target: "portal::ai::stream", %message, "Upstream reported an error");
                                yield ChatStreamEvent::Error(message);
                                return;
                            }
                            StreamLine::Ignored => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(target: "portal::ai::stream", error = %e, "Stream transport failed");
                    yield ChatStreamEvent::Error(e.to_string());
                    return;
                }
                None => break,
            }
        }

        state.send_replace(StreamState::Draining);
        if let Some(line) = decoder.finish() {
            match parse_line(&line) {
                StreamLine::Chunk(text) => { yield ChatStreamEvent::Chunk(text); }
                StreamLine::Error(message) => {
                    yield ChatStreamEvent::Error(message);
                    return;
                }
                StreamLine::Done | StreamLine::Ignored => {}
            }
        }
        yield ChatStreamEvent::Done;
    })
}

/// Receiver of chat stream callbacks.
pub trait ChatStreamHandler: Send + 'static {
    fn on_chunk(&mut self, text: &str);
    fn on_error(&mut self, message: &str);
    fn on_complete(&mut self);
}

/// Adapts three closures into a [`ChatStreamHandler`].
pub struct Callbacks<C, E, D> {
    on_chunk: C,
    on_error: E,
    on_complete: D,
}

pub fn callbacks<C, E, D>(on_chunk: C, on_error: E, on_complete: D) -> Callbacks<C, E, D>
where
    C: FnMut(&str) + Send + 'static,
    E: FnMut(&str) + Send + 'static,
    D: FnMut() + Send + 'static,
{
    Callbacks {
        on_chunk,
        on_error,
        on_complete,
    }
}

impl<C, E, D> ChatStreamHandler for Callbacks<C, E, D>
where
    C: FnMut(&str) + Send + 'static,
    E: FnMut(&str) + Send + 'static,
    D: FnMut() + Send + 'static,
{
    fn on_chunk(&mut self, text: &str) {
        (self.on_chunk)(text);
    }

    fn on_error(&mut self, message: &str) {
        (self.on_error)(message);
    }

    fn on_complete(&mut self) {
        (self.on_complete)();
    }
}

struct Guarded {
    aborted: bool,
    handler: Box<dyn ChatStreamHandler>,
}

/// Control handle for a chat stream started with a handler.
#[derive(Clone)]
pub struct StreamHandle {
    guarded: Arc<Mutex<Guarded>>,
    cancel: CancellationToken,
    state: StateTx,
}

impl StreamHandle {
    /// Drive `events` on a background task, forwarding them to `handler`.
    pub(crate) fn spawn<H>(
        events: ChatEventStream,
        handler: H,
        cancel: CancellationToken,
        state: StateTx,
    ) -> Self
    where
        H: ChatStreamHandler,
    {
        let handle = Self {
            guarded: Arc::new(Mutex::new(Guarded {
                aborted: false,
                handler: Box::new(handler),
            })),
            cancel,
            state,
        };

        let driver = handle.clone();
        tokio::spawn(async move { driver.drive(events).await });
        handle
    }

    async fn drive(self, mut events: ChatEventStream) {
        while let Some(event) = events.next().await {
            let reason = match &event {
                ChatStreamEvent::Chunk(_) => None,
                ChatStreamEvent::Done => Some(CloseReason::Completed),
                ChatStreamEvent::Error(_) => Some(CloseReason::Failed),
            };

            let delivered = self.deliver(|h| match &event {
                ChatStreamEvent::Chunk(text) => h.on_chunk(text),
                ChatStreamEvent::Error(message) => h.on_error(message),
                ChatStreamEvent::Done => h.on_complete(),
            });

            if let Some(reason) = reason {
                self.close(reason);
                return;
            }
            if !delivered {
                return;
            }
        }
        self.close(CloseReason::Aborted);
    }

    /// Run `f` on the handler unless the stream was aborted. Holding the
    /// lock across the call is what makes `abort` a hard barrier.
    fn deliver<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut dyn ChatStreamHandler),
    {
        let mut guarded = match self.guarded.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guarded.aborted {
            return false;
        }
        f(guarded.handler.as_mut());
        true
    }

    fn close(&self, reason: CloseReason) {
        self.state.send_if_modified(|s| {
            if s.is_closed() {
                false
            } else {
                *s = StreamState::Closed(reason);
                true
            }
        });
    }

    /// Cancel the request. Once this returns no callback fires again, and
    /// the abort itself is not reported as an error.
    ///
    /// Must not be called from inside a handler callback.
    pub fn abort(&self) {
        {
            let mut guarded = match self.guarded.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guarded.aborted = true;
        }
        self.cancel.cancel();
        self.close(CloseReason::Aborted);
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Wait until the stream is closed. Callbacks for the terminal event
    /// have run by the time this resolves.
    pub async fn closed(&self) -> CloseReason {
        let mut rx = self.state.subscribe();
        match rx.wait_for(StreamState::is_closed).await {
            Ok(state) => match *state {
                StreamState::Closed(reason) => reason,
                _ => CloseReason::Aborted,
            },
            Err(_) => CloseReason::Aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use proptest::prelude::*;
    use std::convert::Infallible;

    fn body(chunks: &'static [&'static str]) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
        stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(chunks: &'static [&'static str]) -> Vec<ChatStreamEvent> {
        decode_events(body(chunks), CancellationToken::new())
            .collect()
            .await
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(parse_line("data: hi"), StreamLine::Chunk("hi".into()));
        assert_eq!(parse_line("data: [DONE]"), StreamLine::Done);
        assert_eq!(
            parse_line("data: [ERROR] quota exceeded"),
            StreamLine::Error("quota exceeded".into())
        );
        assert_eq!(parse_line("data: [ERROR]"), StreamLine::Error(String::new()));
        assert_eq!(parse_line(""), StreamLine::Ignored);
        assert_eq!(parse_line(": keep-alive"), StreamLine::Ignored);
        assert_eq!(parse_line("data:tight"), StreamLine::Ignored);
    }

    #[test]
    fn decoder_keeps_partial_lines_and_strips_cr() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: a").is_empty());
        assert_eq!(decoder.push(b"b\r\ndata: c\n"), vec!["data: ab", "data: c"]);
        assert_eq!(decoder.finish(), None);
        decoder.push(b"tail");
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
    }

    #[test]
    fn decoder_joins_split_multibyte_characters() {
        let bytes = "data: 你好\n".as_bytes();
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&bytes[..8]).is_empty());
        assert_eq!(decoder.push(&bytes[8..]), vec!["data: 你好"]);
    }

    #[tokio::test]
    async fn sentinel_split_across_chunks() {
        let events = collect(&["data: Hel", "lo\ndata: [DONE]\n"]).await;
        assert_eq!(
            events,
            vec![ChatStreamEvent::Chunk("Hello".into()), ChatStreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn nothing_after_the_done_sentinel() {
        let events = collect(&["data: a\n\ndata: [DONE]\n\ndata: b\n\n"]).await;
        assert_eq!(
            events,
            vec![ChatStreamEvent::Chunk("a".into()), ChatStreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn error_sentinel_ends_the_stream() {
        let events = collect(&["data: partial\n\ndata: [ERROR] model overloaded\n\n"]).await;
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::Chunk("partial".into()),
                ChatStreamEvent::Error("model overloaded".into())
            ]
        );
    }

    #[tokio::test]
    async fn eof_flushes_final_line_and_completes() {
        let events = collect(&["data: one\ndata: two"]).await;
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::Chunk("one".into()),
                ChatStreamEvent::Chunk("two".into()),
                ChatStreamEvent::Done
            ]
        );
    }

    #[tokio::test]
    async fn transport_errors_become_error_events() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: x\n")),
            Err(std::io::Error::other("connection reset")),
        ]);
        let events: Vec<_> = decode_events(body, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::Chunk("x".into()),
                ChatStreamEvent::Error("connection reset".into())
            ]
        );
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ChatStreamHandler for Recorder {
        fn on_chunk(&mut self, text: &str) {
            self.0.lock().unwrap().push(format!("chunk:{text}"));
        }
        fn on_error(&mut self, message: &str) {
            self.0.lock().unwrap().push(format!("error:{message}"));
        }
        fn on_complete(&mut self) {
            self.0.lock().unwrap().push("complete".into());
        }
    }

    fn state_tx() -> StateTx {
        let (tx, _rx) = watch::channel(StreamState::Open);
        Arc::new(tx)
    }

    #[tokio::test]
    async fn handler_sees_chunks_then_completion() {
        let recorder = Recorder::default();
        let cancel = CancellationToken::new();
        let state = state_tx();
        let events = decode_events_with_state(
            body(&["data: a\n", "data: b\ndata: [DONE]\n"]),
            cancel.clone(),
            state.clone(),
        );
        let handle = StreamHandle::spawn(events, recorder.clone(), cancel, state);

        assert_eq!(handle.closed().await, CloseReason::Completed);
        assert_eq!(recorder.events(), vec!["chunk:a", "chunk:b", "complete"]);
    }

    #[tokio::test]
    async fn abort_silences_the_handler() {
        let recorder = Recorder::default();
        let cancel = CancellationToken::new();
        let state = state_tx();
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Bytes, Infallible>>();
        let events = decode_events_with_state(rx, cancel.clone(), state.clone());
        let handle = StreamHandle::spawn(events, recorder.clone(), cancel, state);

        tx.unbounded_send(Ok(Bytes::from_static(b"data: first\n")))
            .unwrap();
        while recorder.events().is_empty() {
            tokio::task::yield_now().await;
        }

        handle.abort();
        let _ = tx.unbounded_send(Ok(Bytes::from_static(b"data: late\ndata: [DONE]\n")));
        drop(tx);

        assert_eq!(handle.closed().await, CloseReason::Aborted);
        assert_eq!(handle.state(), StreamState::Closed(CloseReason::Aborted));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(recorder.events(), vec!["chunk:first"]);
    }

    proptest! {
        #[test]
        fn chunk_boundaries_do_not_change_output(
            cuts in proptest::collection::vec(0usize..64, 0..8)
        ) {
            let payload = "data: Hello\r\n\ndata: 世界\n: ping\ndata: [ERROR] bad\n".as_bytes();

            let whole = {
                let mut decoder = LineDecoder::new();
                let mut lines = decoder.push(payload);
                lines.extend(decoder.finish());
                lines
            };

            let mut points: Vec<usize> = cuts.into_iter().map(|c| c % (payload.len() + 1)).collect();
            points.sort_unstable();
            let mut decoder = LineDecoder::new();
            let mut lines = Vec::new();
            let mut start = 0;
            for point in points {
                lines.extend(decoder.push(&payload[start..point]));
                start = point;
            }
            lines.extend(decoder.push(&payload[start..]));
            lines.extend(decoder.finish());

            prop_assert_eq!(lines, whole);
        }
    }
}
