//! Provider Selection
//!
//! Strategies that pick one provider out of a model's provider list.

use crate::config::{Provider, StrategyKind};
use crate::error::{Result, RouterError};
use crate::router::usage::UsageTracker;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Per-request selection hints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Key that pins a caller to one provider (sticky sessions)
    pub session_key: Option<String>,
}

impl SelectOptions {
    pub fn with_session_key(key: impl Into<String>) -> Self {
        Self {
            session_key: Some(key.into()),
        }
    }
}

/// Picks one provider for a model
///
/// Implementations never mutate `providers` and never return a provider that is
/// not in it.
pub trait SelectionStrategy: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Select a provider from the model's ordered provider list
    fn select(
        &self,
        model_name: &str,
        providers: &[Provider],
        options: &SelectOptions,
    ) -> Result<Provider>;
}

fn ensure_providers(model_name: &str, providers: &[Provider]) -> Result<()> {
    if providers.is_empty() {
        return Err(RouterError::Selection(format!(
            "no providers configured for model '{}'",
            model_name
        )));
    }
    Ok(())
}

/// Least used provider wins, earlier declaration wins ties
#[derive(Debug, Clone)]
pub struct LeastUsed {
    usage: Arc<UsageTracker>,
}

impl LeastUsed {
    pub fn new(usage: Arc<UsageTracker>) -> Self {
        Self { usage }
    }
}

impl SelectionStrategy for LeastUsed {
    fn name(&self) -> &'static str {
        "least_used"
    }

    fn select(
        &self,
        model_name: &str,
        providers: &[Provider],
        _options: &SelectOptions,
    ) -> Result<Provider> {
        ensure_providers(model_name, providers)?;

        let mut winner = &providers[0];
        let mut min_count = u64::MAX;
        for provider in providers {
            let count = self.usage.get(model_name, &provider.id);
            if count < min_count {
                min_count = count;
                winner = provider;
            }
        }

        let count = self.usage.increment(model_name, &winner.id);
        debug!(
            model = model_name,
            provider = %winner.id,
            count,
            "selected least used provider"
        );
        Ok(winner.clone())
    }
}

/// Cycle through providers in declaration order
#[derive(Debug)]
pub struct RoundRobin {
    usage: Arc<UsageTracker>,
    cursors: RwLock<HashMap<String, Arc<AtomicUsize>>>,
}

impl RoundRobin {
    pub fn new(usage: Arc<UsageTracker>) -> Self {
        Self {
            usage,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn cursor(&self, model_name: &str) -> Arc<AtomicUsize> {
        if let Some(cursor) = self.cursors.read().get(model_name) {
            return cursor.clone();
        }
        self.cursors
            .write()
            .entry(model_name.to_string())
            .or_default()
            .clone()
    }
}

impl SelectionStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn select(
        &self,
        model_name: &str,
        providers: &[Provider],
        _options: &SelectOptions,
    ) -> Result<Provider> {
        ensure_providers(model_name, providers)?;

        let idx = self.cursor(model_name).fetch_add(1, Ordering::Relaxed) % providers.len();
        let winner = &providers[idx];
        self.usage.increment(model_name, &winner.id);
        debug!(model = model_name, provider = %winner.id, "selected round robin provider");
        Ok(winner.clone())
    }
}

/// Smooth weighted round-robin on each provider's `weight`
///
/// Over one full cycle every provider is picked `weight` times, interleaved
/// rather than in bursts.
#[derive(Debug)]
pub struct Weighted {
    usage: Arc<UsageTracker>,
    current: RwLock<HashMap<String, Arc<Mutex<HashMap<String, i64>>>>>,
}

impl Weighted {
    pub fn new(usage: Arc<UsageTracker>) -> Self {
        Self {
            usage,
            current: RwLock::new(HashMap::new()),
        }
    }

    fn model_state(&self, model_name: &str) -> Arc<Mutex<HashMap<String, i64>>> {
        if let Some(state) = self.current.read().get(model_name) {
            return state.clone();
        }
        self.current
            .write()
            .entry(model_name.to_string())
            .or_default()
            .clone()
    }
}

impl SelectionStrategy for Weighted {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn select(
        &self,
        model_name: &str,
        providers: &[Provider],
        _options: &SelectOptions,
    ) -> Result<Provider> {
        ensure_providers(model_name, providers)?;

        let state = self.model_state(model_name);
        let winner = {
            let mut current = state.lock();

            let mut total = 0i64;
            let mut best: Option<(usize, i64)> = None;
            for (idx, provider) in providers.iter().enumerate() {
                let weight = i64::try_from(provider.weight()).unwrap_or(i64::MAX);
                total = total.saturating_add(weight);
                let value = current.entry(provider.id.clone()).or_insert(0);
                *value = value.saturating_add(weight);
                if best.map_or(true, |(_, best_value)| *value > best_value) {
                    best = Some((idx, *value));
                }
            }

            let (idx, _) = best.unwrap_or((0, 0));
            if let Some(value) = current.get_mut(&providers[idx].id) {
                *value = value.saturating_sub(total);
            }
            &providers[idx]
        };

        self.usage.increment(model_name, &winner.id);
        debug!(
            model = model_name,
            provider = %winner.id,
            weight = winner.weight(),
            "selected weighted provider"
        );
        Ok(winner.clone())
    }
}

/// Same session key, same provider; least used without a key
#[derive(Debug, Clone)]
pub struct StickySession {
    usage: Arc<UsageTracker>,
    fallback: LeastUsed,
}

impl StickySession {
    pub fn new(usage: Arc<UsageTracker>) -> Self {
        Self {
            fallback: LeastUsed::new(usage.clone()),
            usage,
        }
    }
}

impl SelectionStrategy for StickySession {
    fn name(&self) -> &'static str {
        "sticky_session"
    }

    fn select(
        &self,
        model_name: &str,
        providers: &[Provider],
        options: &SelectOptions,
    ) -> Result<Provider> {
        ensure_providers(model_name, providers)?;

        let Some(key) = options.session_key.as_deref() else {
            return self.fallback.select(model_name, providers, options);
        };

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() % providers.len() as u64) as usize;

        let winner = &providers[idx];
        self.usage.increment(model_name, &winner.id);
        debug!(model = model_name, provider = %winner.id, "selected sticky provider");
        Ok(winner.clone())
    }
}

impl StrategyKind {
    /// Build the strategy, sharing `usage` for its counters
    pub fn build(self, usage: Arc<UsageTracker>) -> Arc<dyn SelectionStrategy> {
        match self {
            StrategyKind::LeastUsed => Arc::new(LeastUsed::new(usage)),
            StrategyKind::RoundRobin => Arc::new(RoundRobin::new(usage)),
            StrategyKind::Weighted => Arc::new(Weighted::new(usage)),
            StrategyKind::StickySession => Arc::new(StickySession::new(usage)),
        }
    }
}
