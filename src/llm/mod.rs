//! LLM module - prompt templates, streaming transport, and output guards

pub mod audit;
pub mod ollama_client;
pub mod prompt;
pub mod sanitize;
pub mod streamer;

pub use audit::{AuditEntry, AuditLog};
pub use ollama_client::OllamaClient;
pub use streamer::{
    CompletionAttempt, CompletionBackend, CompletionStreamer, FragmentResult, FragmentStream,
};
