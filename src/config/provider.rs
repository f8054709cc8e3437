//! Provider Configuration
//!
//! Defines the configuration schema for models and the backend providers serving them.

use crate::error::{Result, RouterError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Root configuration structure
///
/// `active_models` enables model names per model type. Every other top-level
/// object is a model-type section mapping model names to definitions; those are
/// kept untyped until the loader validates the active ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    /// Model names enabled per model type
    #[serde(default)]
    pub active_models: BTreeMap<String, Vec<String>>,

    /// Selection strategy settings
    #[serde(default)]
    pub routing: RoutingSettings,

    /// Keep-alive probe settings
    #[serde(default)]
    pub keep_alive: KeepAliveSettings,

    /// Model-type sections keyed by type name
    #[serde(flatten)]
    pub sections: HashMap<String, serde_json::Value>,
}

impl ModelsConfig {
    /// Check whether any model is enabled at all
    pub fn has_active_models(&self) -> bool {
        self.active_models.values().any(|names| !names.is_empty())
    }
}

/// Backend API dialect of a provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApiType {
    /// OpenAI-compatible chat completions
    OpenAi,

    /// vLLM server (OpenAI-compatible)
    Vllm,

    /// Ollama native chat API
    Ollama,

    /// Anything else, kept verbatim for diagnostics
    Other(String),
}

impl ApiType {
    /// Chat endpoint path for this dialect, `None` when unsupported
    pub fn chat_path(&self) -> Option<&'static str> {
        match self {
            ApiType::OpenAi | ApiType::Vllm => Some("/v1/chat/completions"),
            ApiType::Ollama => Some("/api/chat"),
            ApiType::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ApiType::OpenAi => "openai",
            ApiType::Vllm => "vllm",
            ApiType::Ollama => "ollama",
            ApiType::Other(name) => name,
        }
    }
}

impl From<String> for ApiType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => ApiType::OpenAi,
            "vllm" => ApiType::Vllm,
            "ollama" => ApiType::Ollama,
            _ => ApiType::Other(value),
        }
    }
}

impl From<ApiType> for String {
    fn from(value: ApiType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest `weight` a provider may declare
pub const MAX_WEIGHT: u64 = 1_000_000;

/// A single backend instance serving a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Globally unique provider id
    pub id: String,

    /// Backend API dialect
    pub api_type: ApiType,

    /// Base URL without trailing slash
    pub api_host: String,

    /// Bearer token sent with requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Environment variable holding the token (used when `api_token` is absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token_env: Option<String>,

    /// Backend model identifier, defaults to the logical model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,

    /// Extra fields strategies may use (e.g. `weight`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Provider {
    /// Create a provider with no token, model path or extra fields
    pub fn new(id: impl Into<String>, api_type: ApiType, api_host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_type,
            api_host: api_host.into(),
            api_token: None,
            api_token_env: None,
            model_path: None,
            extra: HashMap::new(),
        }
    }

    /// Backend model identifier to send for the logical `model_name`
    pub fn effective_model<'a>(&'a self, model_name: &'a str) -> &'a str {
        self.model_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .unwrap_or(model_name)
    }

    /// Get the effective token (inline value first, then the env var)
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = self.api_token.as_deref().filter(|t| !t.is_empty()) {
            return Some(token.to_string());
        }

        self.api_token_env
            .as_ref()
            .and_then(|env_var| std::env::var(env_var).ok())
            .filter(|t| !t.is_empty())
    }

    /// Relative capacity used by weighted selection, in `1..=MAX_WEIGHT`
    pub fn weight(&self) -> u64 {
        self.extra
            .get("weight")
            .and_then(|w| w.as_u64())
            .filter(|w| *w > 0)
            .unwrap_or(1)
            .min(MAX_WEIGHT)
    }
}

/// Provider entry as written in the configuration source
///
/// Older configurations spell the base URL `host` instead of `api_host`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRecord {
    pub id: String,

    pub api_type: ApiType,

    #[serde(default)]
    pub api_host: Option<String>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default)]
    pub api_token_env: Option<String>,

    #[serde(default)]
    pub model_path: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProviderRecord {
    /// Base URL from either field name, `api_host` taking precedence
    pub fn host(&self) -> Option<&str> {
        non_empty(&self.api_host).or_else(|| non_empty(&self.host))
    }

    /// Convert into a [`Provider`], `context` names the owning model in errors
    pub fn into_provider(self, context: &str) -> Result<Provider> {
        let api_host = self
            .host()
            .map(|h| h.trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                RouterError::config(format!(
                    "provider '{}' for {} has no api_host",
                    self.id, context
                ))
            })?;

        if let Some(weight) = self.extra.get("weight") {
            if weight.as_u64().map_or(true, |w| w == 0 || w > MAX_WEIGHT) {
                return Err(RouterError::config(format!(
                    "provider '{}' for {} has invalid weight {}, expected 1..={}",
                    self.id, context, weight, MAX_WEIGHT
                )));
            }
        }

        Ok(Provider {
            id: self.id,
            api_type: self.api_type,
            api_host,
            api_token: self.api_token,
            api_token_env: self.api_token_env,
            model_path: self.model_path,
            extra: self.extra,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Strategy used to pick a provider for each request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Least used provider, declaration order breaks ties
    #[default]
    LeastUsed,

    /// Cycle through providers in declaration order
    RoundRobin,

    /// Smooth weighted round-robin on the `weight` field
    Weighted,

    /// Pin a session key to one provider
    StickySession,
}

/// Routing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutingSettings {
    #[serde(default)]
    pub strategy: StrategyKind,
}

/// Keep-alive probe settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeepAliveSettings {
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token budget of the warm-up completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default warm-up prompt
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// How long Ollama should keep the model loaded (e.g. "10m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_keep_alive: Option<String>,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_tokens() -> u32 {
    1
}

fn default_prompt() -> String {
    "ping".to_string()
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            prompt: default_prompt(),
            ollama_keep_alive: None,
        }
    }
}

/// Settings section of a loaded configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewaySettings {
    pub routing: RoutingSettings,
    pub keep_alive: KeepAliveSettings,
}
