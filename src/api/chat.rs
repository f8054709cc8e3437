//! Chat Request Bodies
//!
//! Minimal chat requests in the OpenAI and Ollama dialects, used for warm-up calls.

use serde::{Deserialize, Serialize};

/// A message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user" or "assistant"
    pub role: String,

    pub content: String,
}

impl ChatMessage {
    /// Single user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completion request (also served by vLLM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiChatRequest {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    pub max_tokens: u32,

    pub temperature: f32,

    pub stream: bool,
}

impl OpenAiChatRequest {
    /// Non-streaming, zero-temperature single-turn request
    pub fn warmup(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens,
            temperature: 0.0,
            stream: false,
        }
    }
}

/// Ollama `/api/chat` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatRequest {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    pub stream: bool,

    pub options: OllamaOptions,

    /// How long the model stays loaded after this call (e.g. "10m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

/// Sampling options in Ollama's naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaOptions {
    /// Maximum tokens to generate
    pub num_predict: u32,

    pub temperature: f32,
}

impl OllamaChatRequest {
    /// Non-streaming, zero-temperature single-turn request
    pub fn warmup(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
            options: OllamaOptions {
                num_predict: max_tokens,
                temperature: 0.0,
            },
            keep_alive: None,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Option<String>) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
