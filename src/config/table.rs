//! Routing Table
//!
//! The validated mapping from logical model name to its ordered provider list.

use crate::config::provider::Provider;
use crate::error::{Result, RouterError};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A logical model and the providers serving it, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    /// Logical model name
    pub name: String,

    /// Model type the entry was declared under
    pub model_type: String,

    /// Providers in declaration order (the selection tie-break order)
    pub providers: Vec<Provider>,
}

/// Immutable routing table
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    models: HashMap<String, ModelEntry>,
}

impl RoutingTable {
    /// Create an empty table
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table, rejecting empty provider lists, repeated model names
    /// and provider ids that are not globally unique
    pub fn try_from_entries(entries: Vec<ModelEntry>) -> Result<Self> {
        let mut models: HashMap<String, ModelEntry> = HashMap::with_capacity(entries.len());
        for entry in &entries {
            if entry.providers.is_empty() {
                return Err(RouterError::config(format!(
                    "no providers configured for {}:{}",
                    entry.model_type, entry.name
                )));
            }
        }

        let duplicates = duplicate_ids(&entries);
        if !duplicates.is_empty() {
            return Err(RouterError::config(format!(
                "duplicate provider ids: {:?}",
                duplicates
            )));
        }

        for entry in entries {
            if let Some(existing) = models.get(&entry.name) {
                return Err(RouterError::config(format!(
                    "model '{}' is declared under both {} and {}",
                    entry.name, existing.model_type, entry.model_type
                )));
            }
            models.insert(entry.name.clone(), entry);
        }

        Ok(Self { models })
    }

    /// Get a model entry by name
    pub fn get(&self, model_name: &str) -> Option<&ModelEntry> {
        self.models.get(model_name)
    }

    /// Providers for a model, empty when the model is unknown
    pub fn providers(&self, model_name: &str) -> &[Provider] {
        self.models
            .get(model_name)
            .map(|entry| entry.providers.as_slice())
            .unwrap_or(&[])
    }

    /// Model names in sorted order
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Every (model, host) pair, models sorted, hosts in declaration order
    pub fn endpoints(&self) -> Vec<(String, String)> {
        self.model_names()
            .into_iter()
            .flat_map(|name| {
                self.providers(name)
                    .iter()
                    .map(move |p| (name.to_string(), p.api_host.clone()))
            })
            .collect()
    }

    /// Iterate over all model entries
    pub fn iter(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Provider ids used more than once across all entries, sorted
fn duplicate_ids(entries: &[ModelEntry]) -> Vec<String> {
    let mut id_counts: HashMap<&str, usize> = HashMap::new();
    for provider in entries.iter().flat_map(|e| e.providers.iter()) {
        *id_counts.entry(provider.id.as_str()).or_default() += 1;
    }

    id_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Shared handle to the current routing table
///
/// Readers clone the inner `Arc`; a reload replaces it in one write.
#[derive(Debug, Default)]
pub struct SharedRoutingTable {
    current: RwLock<Arc<RoutingTable>>,
}

impl SharedRoutingTable {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Current table
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.current.read().clone()
    }

    /// Publish a new table, returning the previous one
    pub fn swap(&self, table: RoutingTable) -> Arc<RoutingTable> {
        let mut guard = self.current.write();
        std::mem::replace(&mut *guard, Arc::new(table))
    }
}
