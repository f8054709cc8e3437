//! Provider Usage Tracking
//!
//! Per-model, per-provider selection counters shared by all strategies.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the providers of a single model
#[derive(Debug, Default)]
struct ModelUsage {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl ModelUsage {
    fn get(&self, provider_key: &str) -> u64 {
        self.counters
            .read()
            .get(provider_key)
            .map(|c| c.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    fn increment(&self, provider_key: &str) -> u64 {
        if let Some(counter) = self.counters.read().get(provider_key) {
            return counter.fetch_add(1, Ordering::AcqRel) + 1;
        }

        let counter = self
            .counters
            .write()
            .entry(provider_key.to_string())
            .or_default()
            .clone();
        counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn snapshot(&self) -> HashMap<String, u64> {
        self.counters
            .read()
            .iter()
            .map(|(key, c)| (key.clone(), c.load(Ordering::Acquire)))
            .collect()
    }
}

/// Selection counters keyed by model name, then provider key (the provider id)
///
/// Each counter is its own atomic, so increments are never lost and traffic on
/// one model never waits on another model's counters. Counters live as long as
/// the tracker and are never reset.
#[derive(Debug, Default)]
pub struct UsageTracker {
    models: RwLock<HashMap<String, Arc<ModelUsage>>>,
}

impl UsageTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn model(&self, model_name: &str) -> Option<Arc<ModelUsage>> {
        self.models.read().get(model_name).cloned()
    }

    fn model_or_insert(&self, model_name: &str) -> Arc<ModelUsage> {
        if let Some(usage) = self.model(model_name) {
            return usage;
        }

        self.models
            .write()
            .entry(model_name.to_string())
            .or_default()
            .clone()
    }

    /// Current count, 0 if never selected
    pub fn get(&self, model_name: &str, provider_key: &str) -> u64 {
        self.model(model_name)
            .map(|usage| usage.get(provider_key))
            .unwrap_or(0)
    }

    /// Add one selection and return the new count
    pub fn increment(&self, model_name: &str, provider_key: &str) -> u64 {
        self.model_or_insert(model_name).increment(provider_key)
    }

    /// Copy of all counters recorded for a model
    pub fn snapshot(&self, model_name: &str) -> HashMap<String, u64> {
        self.model(model_name)
            .map(|usage| usage.snapshot())
            .unwrap_or_default()
    }

    /// Sum of all counters recorded for a model
    pub fn total(&self, model_name: &str) -> u64 {
        self.snapshot(model_name).values().sum()
    }
}
