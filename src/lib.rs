//! llmroute - routing core for an LLM gateway
//!
//! Turns a model/provider description into a validated routing table, picks one
//! backend per request while keeping backends evenly loaded, and sends cheap
//! warm-up calls so idle backends stay resident.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod router;
pub mod telemetry;

use client::{KeepAliveProbe, ProbeOutcome};
use config::{ConfigLoader, Provider, RoutingTable, SharedRoutingTable};
use error::{Result, RouterError};
use router::{SelectOptions, SelectionStrategy, UsageTracker};

/// The routing core: table, usage counters, strategy and keep-alive probe
pub struct Gateway {
    /// Current routing table, swapped whole on reload
    table: Arc<SharedRoutingTable>,

    /// Selection counters shared with the strategy
    usage: Arc<UsageTracker>,

    /// Provider selection strategy
    strategy: Arc<dyn SelectionStrategy>,

    /// Warm-up prober
    probe: KeepAliveProbe,

    /// File to re-read on reload
    source: Option<PathBuf>,
}

impl Gateway {
    /// Create a gateway from the default models file locations
    ///
    /// A `.env` file is loaded first so `api_token_env` variables can live there.
    pub fn new() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_loader(ConfigLoader::new()?)
    }

    /// Create a gateway from a specific models file
    pub fn from_path(path: &str) -> Result<Self> {
        Self::from_loader(ConfigLoader::from_path(path)?)
    }

    /// Create a gateway from an already parsed configuration
    pub fn from_loader(loader: ConfigLoader) -> Result<Self> {
        let table = loader.build_table()?;
        let settings = loader.settings();

        let table = Arc::new(SharedRoutingTable::new(table));
        let usage = Arc::new(UsageTracker::new());
        let strategy = settings.routing.strategy.build(usage.clone());
        let probe = KeepAliveProbe::new(table.clone(), settings.keep_alive)?;

        info!(
            models = table.snapshot().len(),
            strategy = strategy.name(),
            "gateway ready"
        );

        Ok(Self {
            table,
            usage,
            strategy,
            probe,
            source: loader.source().map(PathBuf::from),
        })
    }

    /// Replace the selection strategy
    pub fn with_strategy(mut self, strategy: Arc<dyn SelectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Current routing table
    pub fn table(&self) -> Arc<RoutingTable> {
        self.table.snapshot()
    }

    /// Selection counters
    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub fn strategy(&self) -> &Arc<dyn SelectionStrategy> {
        &self.strategy
    }

    pub fn probe(&self) -> &KeepAliveProbe {
        &self.probe
    }

    /// Pick a provider for `model_name`
    pub fn select(&self, model_name: &str) -> Result<Provider> {
        self.select_with(model_name, &SelectOptions::default())
    }

    /// Pick a provider for `model_name` with selection hints
    pub fn select_with(&self, model_name: &str, options: &SelectOptions) -> Result<Provider> {
        let table = self.table.snapshot();
        self.strategy
            .select(model_name, table.providers(model_name), options)
    }

    /// Re-read the models file and publish the new table
    ///
    /// On any error the current table stays in place.
    pub fn reload(&self) -> Result<()> {
        let path = self.source.as_ref().ok_or_else(|| {
            RouterError::config("gateway was not loaded from a file, nothing to reload")
        })?;
        self.reload_from(&ConfigLoader::from_path(path)?)
    }

    /// Build a table from `loader` and publish it
    ///
    /// Strategy and keep-alive settings are fixed at construction; only the
    /// table changes.
    pub fn reload_from(&self, loader: &ConfigLoader) -> Result<()> {
        let table = loader.build_table()?;
        let models = table.len();
        self.table.swap(table);
        info!(models, "routing table reloaded");
        Ok(())
    }

    /// Warm up the provider serving `model_name` at `host`; never fails
    pub async fn keep_alive(&self, model_name: &str, host: &str, prompt: Option<&str>) {
        self.probe.send(model_name, host, prompt).await;
    }

    /// Warm up every (model, host) pair concurrently
    pub async fn keep_alive_all(&self) -> Vec<ProbeOutcome> {
        self.probe.send_all(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MODELS: &str = r#"{
        "active_models": { "chat": ["m1"] },
        "chat": {
            "m1": {
                "providers": [
                    { "id": "p1", "api_type": "ollama", "api_host": "http://h1" },
                    { "id": "p2", "api_type": "vllm", "api_host": "http://h2" }
                ]
            }
        }
    }"#;

    fn models_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_select_balances_in_declaration_order() {
        let gateway = Gateway::from_loader(ConfigLoader::from_json(MODELS).unwrap()).unwrap();

        let picked: Vec<String> = (0..3)
            .map(|_| gateway.select("m1").unwrap().id)
            .collect();
        assert_eq!(picked, vec!["p1", "p2", "p1"]);
        assert_eq!(gateway.usage().get("m1", "p1"), 2);
    }

    #[test]
    fn test_select_unknown_model_fails() {
        let gateway = Gateway::from_loader(ConfigLoader::from_json(MODELS).unwrap()).unwrap();
        let err = gateway.select("m9").unwrap_err();
        assert!(err.is_selection());
        assert!(err.to_string().contains("'m9'"));
    }

    #[test]
    fn test_empty_configuration_starts() {
        let gateway = Gateway::from_loader(
            ConfigLoader::from_json(r#"{ "active_models": { "chat": [] } }"#).unwrap(),
        )
        .unwrap();
        assert!(gateway.table().is_empty());
        assert!(gateway.select("m1").is_err());
    }

    #[test]
    fn test_strategy_from_settings() {
        let json = MODELS.replacen('{', r#"{ "routing": { "strategy": "round_robin" },"#, 1);
        let gateway = Gateway::from_loader(ConfigLoader::from_json(&json).unwrap()).unwrap();
        assert_eq!(gateway.strategy().name(), "round_robin");

        let usage = Arc::new(UsageTracker::new());
        let gateway = gateway.with_strategy(StrategyKind::Weighted.build(usage));
        assert_eq!(gateway.strategy().name(), "weighted");
    }

    #[test]
    fn test_reload_swaps_table() {
        let file = models_file(MODELS);
        let gateway = Gateway::from_path(file.path().to_str().unwrap()).unwrap();
        let before = gateway.table();

        std::fs::write(
            file.path(),
            MODELS.replace(r#""chat": ["m1"]"#, r#""chat": ["m1", "m2"]"#).replace(
                r#""chat": {"#,
                r#""chat": {
            "m2": { "providers": [
                { "id": "p3", "api_type": "openai", "api_host": "http://h3" }
            ] },"#,
            ),
        )
        .unwrap();

        gateway.reload().unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(gateway.table().model_names(), vec!["m1", "m2"]);
        assert_eq!(gateway.select("m2").unwrap().id, "p3");
    }

    #[test]
    fn test_failed_reload_keeps_current_table() {
        let file = models_file(MODELS);
        let gateway = Gateway::from_path(file.path().to_str().unwrap()).unwrap();

        std::fs::write(
            file.path(),
            r#"{ "active_models": { "chat": ["m1"] }, "chat": { "m1": {} } }"#,
        )
        .unwrap();

        let err = gateway.reload().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(gateway.table().providers("m1").len(), 2);
    }

    #[test]
    fn test_reload_without_source() {
        let gateway = Gateway::from_loader(ConfigLoader::from_json(MODELS).unwrap()).unwrap();
        assert!(gateway.reload().is_err());
    }

    #[test]
    fn test_counters_survive_reload() {
        let file = models_file(MODELS);
        let gateway = Gateway::from_path(file.path().to_str().unwrap()).unwrap();
        gateway.select("m1").unwrap();

        gateway.reload().unwrap();
        assert_eq!(gateway.select("m1").unwrap().id, "p2");
    }

    #[tokio::test]
    async fn test_keep_alive_unknown_pair_is_silent() {
        let gateway = Gateway::from_loader(ConfigLoader::from_json(MODELS).unwrap()).unwrap();
        gateway.keep_alive("m1", "http://nowhere", None).await;
        gateway.keep_alive("model:m9", "http://h1", Some("hi")).await;
    }
}
