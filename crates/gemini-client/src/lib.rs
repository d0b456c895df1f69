pub mod client;
pub mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient, GeminiError};
pub use types::GenerationConfig;
