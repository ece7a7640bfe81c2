//! Line-oriented terminal front-end
//!
//! Renders conversation notifications as they arrive and turns stdin lines
//! into `submit`/`reset` calls. Submissions run on their own task so a reset
//! can be typed while a request is in flight.

use crate::backend::QaService;
use crate::conversation::{ConversationEvent, ConversationView, Role, Turn};
use crate::runtime::ConversationSession;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// A parsed unit of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Reset,
    Quit,
}

/// Accumulates input lines; a trailing `\` continues onto the next line
#[derive(Debug, Default)]
pub struct InputBuffer {
    partial: String,
}

impl InputBuffer {
    /// Feed one line (without its newline). `None` means more input is needed.
    pub fn push_line(&mut self, line: &str) -> Option<Command> {
        match line.trim() {
            "/clear" | "/reset" => {
                self.partial.clear();
                return Some(Command::Reset);
            }
            "/quit" | "/exit" if self.partial.is_empty() => return Some(Command::Quit),
            _ => {}
        }

        if let Some(head) = line.strip_suffix('\\') {
            self.partial.push_str(head);
            self.partial.push('\n');
            return None;
        }

        self.partial.push_str(line);
        Some(Command::Submit(std::mem::take(&mut self.partial)))
    }

    pub fn is_continuing(&self) -> bool {
        !self.partial.is_empty()
    }
}

/// Format a turn for the terminal, indenting continuation lines
pub fn render_turn(turn: &Turn) -> String {
    let prefix = match turn.role() {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let indent = " ".repeat(prefix.len() + 2);
    let mut out = String::new();
    for (i, line) in turn.text().split('\n').enumerate() {
        if i == 0 {
            out.push_str(prefix);
            out.push_str("> ");
        } else {
            out.push('\n');
            out.push_str(&indent);
        }
        out.push_str(line);
    }
    out
}

fn render_view(view: &ConversationView) {
    for turn in &view.turns {
        println!("{}", render_turn(turn));
    }
}

/// Print notifications until the session is dropped
async fn render_events(mut rx: tokio::sync::broadcast::Receiver<ConversationEvent>) {
    loop {
        match rx.recv().await {
            // The user's own turns are already on screen as typed
            Ok(ConversationEvent::TurnAppended(turn)) if turn.role() == Role::User => {}
            Ok(ConversationEvent::TurnAppended(turn)) => println!("{}", render_turn(&turn)),
            Ok(ConversationEvent::PendingChanged(true)) => println!("... thinking"),
            Ok(ConversationEvent::PendingChanged(false) | ConversationEvent::ErrorChanged(None)) => {}
            Ok(ConversationEvent::ErrorChanged(Some(error))) => {
                println!("[!] {}", error.banner);
            }
            Ok(ConversationEvent::Reset(view)) => {
                println!("--- conversation cleared ---");
                render_view(&view);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Console renderer lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Run the console until `/quit` or end of input
pub async fn run<B>(session: Arc<ConversationSession<B>>) -> std::io::Result<()>
where
    B: QaService + 'static,
{
    render_view(&session.view());
    println!("(Enter sends, end a line with \\ to continue, /clear resets, /quit exits)");

    let renderer = tokio::spawn(render_events(session.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = InputBuffer::default();

    while let Some(line) = lines.next_line().await? {
        match input.push_line(&line) {
            None => {}
            Some(Command::Quit) => break,
            Some(Command::Reset) => session.reset(),
            Some(Command::Submit(text)) => {
                let session = session.clone();
                tokio::spawn(async move {
                    session.submit(&text).await;
                });
            }
        }
    }

    if input.is_continuing() {
        tracing::debug!("Discarding unfinished multi-line input");
    }
    renderer.abort();
    Ok(())
}
