pub mod client;
pub mod types;

pub use client::{Credential, DEFAULT_BASE_URL, SpeechClient, SpeechError};
pub use types::RecognizeResponse;
