//! Provider Resolution
//!
//! Maps a (model, host) pair back to the provider serving it.

use crate::config::{Provider, RoutingTable};
use thiserror::Error;

/// A provider matched by host, with the backend model to request
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProvider {
    pub provider: Provider,

    /// `model_path` if set, otherwise the logical model name
    pub model: String,
}

/// Why a (model, host) pair could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("model '{0}' is not in the routing table")]
    UnknownModel(String),

    #[error("no provider for model '{model}' has host '{host}'")]
    UnknownHost { model: String, host: String },
}

/// Strip one leading `model:` and/or one leading `host:` prefix and trim whitespace
///
/// Absent input normalizes to an empty string.
pub fn normalize_model_name(name: Option<&str>) -> String {
    let Some(name) = name else {
        return String::new();
    };

    let mut name = name.trim();
    if let Some(rest) = name.strip_prefix("model:") {
        name = rest.trim_start();
    }
    if let Some(rest) = name.strip_prefix("host:") {
        name = rest.trim_start();
    }

    name.trim().to_string()
}

/// Host a provider is reachable at
pub fn provider_host(provider: &Provider) -> &str {
    &provider.api_host
}

/// Find the provider of `model_name` whose host equals `host` exactly
///
/// Hosts are stored without their trailing `/` (see `ProviderRecord::into_provider`),
/// so a provider declared as `http://h1/` is found with `http://h1`. The caller's
/// `host` is not normalized.
pub fn find_provider(
    table: &RoutingTable,
    model_name: &str,
    host: &str,
) -> Result<ResolvedProvider, ResolveError> {
    let model = normalize_model_name(Some(model_name));
    let entry = table
        .get(&model)
        .ok_or_else(|| ResolveError::UnknownModel(model.clone()))?;

    let provider = entry
        .providers
        .iter()
        .find(|p| provider_host(p) == host)
        .ok_or_else(|| ResolveError::UnknownHost {
            model: model.clone(),
            host: host.to_string(),
        })?;

    Ok(ResolvedProvider {
        model: provider.effective_model(&entry.name).to_string(),
        provider: provider.clone(),
    })
}
