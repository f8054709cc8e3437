//! Configuration Module
//!
//! Handles model/provider configuration loading and validation.

pub mod loader;
pub mod provider;
pub mod table;

pub use loader::{ConfigLoader, MODELS_PATH_ENV};
pub use provider::{
    ApiType, GatewaySettings, KeepAliveSettings, ModelsConfig, Provider, ProviderRecord,
    RoutingSettings, StrategyKind,
};
pub use table::{ModelEntry, RoutingTable, SharedRoutingTable};
