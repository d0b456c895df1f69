pub mod backends;
pub mod conversation;
pub mod orchestrator;
pub mod outcome;
pub mod resolver;

pub use backends::{Backends, FileTranscription, SpeechCapture, TextGeneration, WebSearch};
pub use conversation::{Conversation, Role, Turn};
pub use orchestrator::{TurnOrchestrator, TurnPhase, TurnReport};
pub use outcome::{AdapterError, ErrorKind, Outcome};
pub use resolver::{InputEvent, InputSource, Resolution, Route, Signals};
