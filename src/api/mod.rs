//! API Module
//!
//! Chat request bodies for the supported backend dialects.

pub mod chat;

pub use chat::{ChatMessage, OllamaChatRequest, OllamaOptions, OpenAiChatRequest};
