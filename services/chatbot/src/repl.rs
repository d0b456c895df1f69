//! Terminal chat surface.
//!
//! Every input line is one tick. Slash tokens mark the non-text signals of
//! the tick (`/mic`, `/search`, `/upload <path>`) and the remaining words are
//! the typed message. A few lines are meta commands handled here without
//! touching the conversation.

use chatbot_core::{Conversation, InputEvent, Turn, TurnOrchestrator, TurnReport};
use std::io::Write;
use std::path::PathBuf;

pub const TITLE: &str = "Gemini Chatbot";
pub const ABOUT: &str = "This chatbot uses Google's Gemini API to generate responses.\n\
Please ensure you have set your GEMINI_API_KEY in the .env file.";
pub const PROMPT: &str = "What would you like to know? > ";

pub const HELP: &str = "\
Type a message and press enter to chat.
  /mic              speak instead of typing (takes priority over everything else)
  /upload <path>    transcribe a LINEAR16 audio file and use it as the message
  /search           send the message to web search instead of the model
  /history          show the conversation so far
  /help             show this help
  /quit, /exit      leave";

#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error("/upload needs a file path")]
    MissingUploadPath,
    #[error("unknown command {0}, try /help")]
    UnknownCommand(String),
    #[error("could not read {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The signals typed on one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tick {
    pub text: Option<String>,
    pub mic: bool,
    pub search: bool,
    pub upload: Option<PathBuf>,
}

impl Tick {
    /// Reads the uploaded file, if any, and turns the tick into the events
    /// the orchestrator understands.
    pub async fn into_events(self) -> Result<Vec<InputEvent>, ReplError> {
        let mut events = Vec::new();
        match (self.text, self.search) {
            (Some(text), true) => events.push(InputEvent::TypedTextWithSearch(text)),
            (Some(text), false) => events.push(InputEvent::TypedText(text)),
            (None, true) => events.push(InputEvent::SearchTrigger),
            (None, false) => {}
        }
        if self.mic {
            events.push(InputEvent::MicTrigger);
        }
        if let Some(path) = self.upload {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| ReplError::Upload { path, source })?;
            events.push(InputEvent::UploadedAudio(bytes));
        }
        Ok(events)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History,
    Quit,
    Tick(Tick),
}

pub fn parse_line(line: &str) -> Result<Command, ReplError> {
    match line.trim() {
        "/help" => return Ok(Command::Help),
        "/history" => return Ok(Command::History),
        "/quit" | "/exit" => return Ok(Command::Quit),
        _ => {}
    }

    let mut tick = Tick::default();
    let mut words = Vec::new();
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "/mic" => tick.mic = true,
            "/search" => tick.search = true,
            "/upload" => {
                let path = tokens.next().ok_or(ReplError::MissingUploadPath)?;
                tick.upload = Some(PathBuf::from(path));
            }
            "/help" | "/history" | "/quit" | "/exit" => {
                return Err(ReplError::UnknownCommand(format!("{token} (use it on its own)")));
            }
            t if t.starts_with('/') && t.len() > 1 && t[1..].chars().all(char::is_alphabetic) => {
                return Err(ReplError::UnknownCommand(t.to_string()));
            }
            word => words.push(word),
        }
    }
    if !words.is_empty() {
        tick.text = Some(words.join(" "));
    }
    Ok(Command::Tick(tick))
}

pub fn render_turn(turn: &Turn) -> String {
    format!("[{}] {}", turn.role().as_str(), turn.content())
}

pub fn banner() -> String {
    format!("{TITLE}\n\n{ABOUT}\n\nType /help for commands.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the session: the orchestrator and the transcript it writes to.
pub struct Repl {
    orchestrator: TurnOrchestrator,
    conversation: Conversation,
}

impl Repl {
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        Self {
            orchestrator,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Handles one input line, writing whatever should be shown to `out`.
    pub async fn handle_line<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> std::io::Result<Flow> {
        let tick = match parse_line(line) {
            Ok(Command::Quit) => return Ok(Flow::Quit),
            Ok(Command::Help) => {
                writeln!(out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            Ok(Command::History) => {
                if self.conversation.is_empty() {
                    writeln!(out, "(no messages yet)")?;
                }
                for turn in self.conversation.turns() {
                    writeln!(out, "{}", render_turn(turn))?;
                }
                return Ok(Flow::Continue);
            }
            Ok(Command::Tick(tick)) => tick,
            Err(e) => {
                writeln!(out, "warning: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        let events = match tick.into_events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Could not build input events: {}", e);
                writeln!(out, "warning: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        match self.orchestrator.run_turn(&mut self.conversation, events).await {
            TurnReport::Skipped => {}
            TurnReport::Warning { detail, .. } => writeln!(out, "warning: {detail}")?,
            TurnReport::Recorded(_) => {
                for turn in self.conversation.last(2) {
                    writeln!(out, "{}", render_turn(turn))?;
                }
            }
        }
        Ok(Flow::Continue)
    }
}
