//! Router Module
//!
//! Provider selection, usage tracking and (model, host) resolution.

pub mod resolver;
pub mod strategy;
pub mod usage;

pub use resolver::{
    find_provider, normalize_model_name, provider_host, ResolveError, ResolvedProvider,
};
pub use strategy::{
    LeastUsed, RoundRobin, SelectOptions, SelectionStrategy, StickySession, Weighted,
};
pub use usage::UsageTracker;
