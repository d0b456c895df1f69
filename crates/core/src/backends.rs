use crate::outcome::Outcome;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

// One trait per backend capability. Every method returns an `Outcome`
// rather than a `Result`: failures are part of the conversation, so an
// implementation must convert its own errors before returning.

/// Sends a single-turn prompt to a generative-language model.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn generate(&self, prompt: &str) -> Outcome;
}

/// Listens on a local input device and transcribes the first phrase heard.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    async fn listen(&self) -> Outcome;
}

/// Transcribes an uploaded buffer of raw audio.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileTranscription: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Outcome;
}

/// Runs a web search and formats the hits as a single text block.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Outcome;
}

/// The set of adapters a `TurnOrchestrator` dispatches to.
pub struct Backends {
    pub text: Box<dyn TextGeneration>,
    pub microphone: Box<dyn SpeechCapture>,
    pub file: Box<dyn FileTranscription>,
    pub search: Box<dyn WebSearch>,
}
