pub mod config;
pub mod file_adapter;
pub mod gemini_adapter;
pub mod microphone_adapter;
pub mod repl;
pub mod search_adapter;
