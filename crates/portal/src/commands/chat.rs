use async_trait::async_trait;
use eyre::Result;
use portal_core::AppState;
use portal_core::ai::{AiService, ChatRequest, ChatRole, ChatStreamHandler, CloseReason};
use portal_core::store::AiStore;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Command, interrupted};

pub struct ChatCommand {
    pub message: Option<String>,
}

/// One line typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Clear,
    Exit,
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/clear" => Input::Clear,
        "/exit" | "/quit" => Input::Exit,
        text => Input::Message(text),
    }
}

/// Writes the reply as it arrives and mirrors it into the chat history.
struct TerminalReply {
    store: AiStore,
    reply: String,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl TerminalReply {
    fn new(store: AiStore, out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            store,
            reply: String::new(),
            out,
            err,
        }
    }
}

impl ChatStreamHandler for TerminalReply {
    fn on_chunk(&mut self, text: &str) {
        self.reply.push_str(text);
        self.store.update_last_assistant_message(self.reply.clone());
        let _ = write!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn on_error(&mut self, message: &str) {
        let _ = writeln!(self.err, "\nchat failed: {message}");
    }

    fn on_complete(&mut self) {
        let _ = writeln!(self.out);
    }
}

/// Send `message` with the prior history and stream the answer to the
/// terminal. Ctrl-C stops the reply.
async fn turn(ai: &AiService, store: &AiStore, message: &str) -> CloseReason {
    let request = ChatRequest::new(message).with_history(store.chat_history());
    store.add_chat_message(ChatRole::User, message);
    store.set_streaming(true);

    let handle = ai.start_stream(
        request,
        TerminalReply::new(
            store.clone(),
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        ),
    );
    let reason = tokio::select! {
        reason = handle.closed() => reason,
        () = interrupted() => {
            handle.abort();
            let mut stdout = std::io::stdout();
            let _ = writeln!(stdout, "\n[stopped]");
            CloseReason::Aborted
        }
    };
    store.set_streaming(false);
    reason
}

#[async_trait]
impl Command for ChatCommand {
    async fn execute(&self, state: &AppState) -> Result<()> {
        let ai = state.services()?.ai;
        let store = state.ai.clone();
        store.open_modal(Some(portal_core::store::AiMode::Chat));

        if let Some(message) = &self.message {
            let reason = turn(&ai, &store, message).await;
            store.close_modal();
            if reason == CloseReason::Failed {
                eyre::bail!("chat request failed");
            }
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        writeln!(stdout, "Type a message. /clear resets the conversation, /exit quits.")?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            write!(stdout, "> ")?;
            stdout.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse_input(&line) {
                Input::Empty => {}
                Input::Exit => break,
                Input::Clear => {
                    store.clear_chat_history();
                    writeln!(stdout, "Conversation cleared")?;
                }
                Input::Message(text) => {
                    turn(&ai, &store, text).await;
                }
            }
        }
        store.close_modal();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn slash_commands_are_recognised() {
        assert_eq!(parse_input("  /clear "), Input::Clear);
        assert_eq!(parse_input("/quit"), Input::Exit);
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input(" hello "), Input::Message("hello"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn streamed_reply_accumulates_in_history() {
        let store = AiStore::new();
        store.add_chat_message(ChatRole::User, "hi");
        let (out, err) = (Captured::default(), Captured::default());
        let mut reply = TerminalReply::new(
            store.clone(),
            Box::new(out.clone()),
            Box::new(err.clone()),
        );
        reply.on_chunk("Hel");
        reply.on_chunk("lo");
        reply.on_complete();

        let history = store.chat_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[1].content, "Hello");
        assert_eq!(out.text(), "Hello\n");
        assert_eq!(err.text(), "");
    }

    #[test]
    fn stream_errors_go_to_the_error_writer() {
        let (out, err) = (Captured::default(), Captured::default());
        let mut reply = TerminalReply::new(
            AiStore::new(),
            Box::new(out.clone()),
            Box::new(err.clone()),
        );
        reply.on_error("HTTP 500");

        assert_eq!(out.text(), "");
        assert_eq!(err.text(), "\nchat failed: HTTP 500\n");
    }
}
