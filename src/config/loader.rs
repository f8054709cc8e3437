//! Configuration Loader
//!
//! Reads the model/provider description and builds a validated routing table.

use crate::config::provider::{GatewaySettings, ModelsConfig, ProviderRecord};
use crate::config::table::{ModelEntry, RoutingTable};
use crate::error::{Result, RouterError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at a models file
pub const MODELS_PATH_ENV: &str = "LLMROUTE_MODELS_PATH";

/// Configuration loader
pub struct ConfigLoader {
    config: ModelsConfig,
    source: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load from the first models file found in the default locations
    pub fn new() -> Result<Self> {
        let paths = Self::get_config_paths();

        match paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_path(path),
            None => Err(RouterError::config(format!(
                "no models file found, searched: {}",
                paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Create a loader from a specific models file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RouterError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: ModelsConfig = serde_json::from_str(&content).map_err(|e| {
            RouterError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "loaded models file");

        Ok(Self {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    /// Create a loader from in-memory JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ModelsConfig = serde_json::from_str(json)?;
        Ok(Self {
            config,
            source: None,
        })
    }

    /// Parse `source` and build its routing table in one step
    pub fn load(source: &str) -> Result<RoutingTable> {
        Self::from_json(source)?.build_table()
    }

    /// Get list of config paths to check, in priority order
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(custom_path) = std::env::var(MODELS_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths.push(PathBuf::from("models.json"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("llmroute").join("models.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".llmroute").join("models.json"));
        }

        paths
    }

    /// Build the routing table for every active model
    ///
    /// Either the whole table validates or an error is returned; nothing partial
    /// escapes.
    pub fn build_table(&self) -> Result<RoutingTable> {
        if !self.config.has_active_models() {
            info!("no active models configured");
            return Ok(RoutingTable::empty());
        }

        let mut entries = Vec::new();
        for (model_type, names) in &self.config.active_models {
            for name in names {
                entries.push(self.build_entry(model_type, name)?);
            }
        }

        let table = RoutingTable::try_from_entries(entries)?;
        info!(models = table.len(), "routing table built");
        Ok(table)
    }

    fn build_entry(&self, model_type: &str, name: &str) -> Result<ModelEntry> {
        let context = format!("{}:{}", model_type, name);

        let definition = self
            .config
            .sections
            .get(model_type)
            .and_then(|section| section.get(name))
            .ok_or_else(|| {
                RouterError::config(format!("missing model definition for {}", context))
            })?;

        let providers = match definition.get("providers") {
            None | Some(serde_json::Value::Null) => {
                return Err(RouterError::config(format!(
                    "missing providers for {}",
                    context
                )))
            }
            Some(value) => value,
        };

        let records: Vec<ProviderRecord> = serde_json::from_value(providers.clone())
            .map_err(|e| RouterError::config(format!("invalid providers for {}: {}", context, e)))?;

        let providers = records
            .into_iter()
            .map(|record| record.into_provider(&context))
            .collect::<Result<Vec<_>>>()?;

        Ok(ModelEntry {
            name: name.to_string(),
            model_type: model_type.to_string(),
            providers,
        })
    }

    /// Get the parsed configuration
    pub fn config(&self) -> &ModelsConfig {
        &self.config
    }

    /// Settings carried alongside the models
    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            routing: self.config.routing.clone(),
            keep_alive: self.config.keep_alive.clone(),
        }
    }

    /// File the configuration was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
