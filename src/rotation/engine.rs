//! Shared rotation engine
//!
//! State is partitioned per category: the category table sits behind a
//! `RwLock` and each category behind its own `Mutex`, so selections in one
//! category serialize while different categories proceed in parallel.
//! Selections are persisted in batches on a background thread; a failed
//! background flush is logged and never surfaces to the caller.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::store::HistoryStore;
use super::strategy::{choose, RotationStrategy, StrategyParams};
use super::{diversity_score, history_key, RotationHistory, UsageRecord};
use crate::config::RotationSettings;
use crate::content::selector::stable_hash;
use crate::error::Result;

/// Outcome of one selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub item: String,
    pub index: usize,
    /// Concrete strategy applied, with `Auto` already resolved
    pub strategy: RotationStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub items: BTreeMap<String, UsageRecord>,
    pub total_uses: u64,
}

struct CategoryState {
    records: BTreeMap<String, UsageRecord>,
    sequence: usize,
    rng: StdRng,
}

pub struct RotationEngine {
    store: Arc<dyn HistoryStore>,
    settings: RotationSettings,
    strategy: RotationStrategy,
    seed: Option<u64>,
    /// History as loaded, for categories and items not yet touched
    baseline: RwLock<RotationHistory>,
    categories: RwLock<HashMap<String, Arc<Mutex<CategoryState>>>>,
    fragments: Mutex<BTreeMap<String, u64>>,
    pending: AtomicUsize,
    generation: AtomicU64,
    /// Held while numbering a flush and taking its snapshot, so a higher
    /// generation always carries a newer snapshot
    snapshot_lock: Mutex<()>,
    written: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RotationEngine {
    /// Load history from `store` and start with the `Auto` strategy.
    pub fn open(store: Arc<dyn HistoryStore>, settings: RotationSettings) -> Result<Self> {
        let history = store.load()?;
        info!(
            records = history.records.len(),
            fragments = history.fragments.len(),
            "Loaded rotation history"
        );
        let fragments = history.fragments.clone();
        Ok(Self {
            store,
            settings,
            strategy: RotationStrategy::Auto,
            seed: None,
            baseline: RwLock::new(history),
            categories: RwLock::new(HashMap::new()),
            fragments: Mutex::new(fragments),
            pending: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            snapshot_lock: Mutex::new(()),
            written: Arc::new(Mutex::new(0)),
        })
    }

    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Seed the per-category random sources for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn strategy(&self) -> RotationStrategy {
        self.strategy
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    /// Choose among `candidates` with the engine's strategy and record the
    /// use. `None` when there are no candidates.
    pub fn select<S: AsRef<str>>(&self, category: &str, candidates: &[S]) -> Option<Selection> {
        self.select_with(category, candidates, self.strategy)
    }

    pub fn select_with<S: AsRef<str>>(
        &self,
        category: &str,
        candidates: &[S],
        strategy: RotationStrategy,
    ) -> Option<Selection> {
        if candidates.is_empty() {
            return None;
        }
        let params = StrategyParams {
            window: self.settings.window,
            exploration_bonus: self.settings.exploration_bonus,
            top_k: self.settings.performance_top_k,
            auto_min_uses: self.settings.auto_min_uses,
            now: Utc::now(),
        };

        let state = self.category(category);
        let selection = {
            let mut state = lock(&state);
            let records: Vec<UsageRecord> = candidates
                .iter()
                .map(|c| self.current_record(&state, category, c.as_ref()))
                .collect();

            let CategoryState { sequence, rng, .. } = &mut *state;
            let (index, resolved) = choose(strategy, &records, sequence, &params, rng);
            let item = candidates[index].as_ref().to_string();

            let mut record = records[index].clone();
            record.mark_used(params.now);
            state.records.insert(item.clone(), record);

            Selection {
                item,
                index,
                strategy: resolved,
            }
        };

        self.note_change();
        Some(selection)
    }

    /// Record whether content built from `item` performed well.
    pub fn record_performance(&self, category: &str, item: &str, success: bool) {
        let state = self.category(category);
        {
            let mut state = lock(&state);
            let mut record = self.current_record(&state, category, item);
            record.record_outcome(success);
            state.records.insert(item.to_string(), record);
        }
        self.note_change();
    }

    /// Count one occurrence of a pattern or structural fragment.
    pub fn record_fragment(&self, fragment: &str) {
        *lock(&self.fragments).entry(fragment.to_string()).or_insert(0) += 1;
    }

    /// Normalised entropy of fragment frequencies, `0.0..=1.0`
    pub fn diversity_score(&self) -> f64 {
        diversity_score(&lock(&self.fragments))
    }

    pub fn category_stats(&self, category: &str) -> CategoryStats {
        let prefix = format!("{category}:");
        let mut items: BTreeMap<String, UsageRecord> = self
            .baseline
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .records
            .iter()
            .filter_map(|(key, record)| {
                key.strip_prefix(&prefix)
                    .filter(|item| !item.contains(':'))
                    .map(|item| (item.to_string(), record.clone()))
            })
            .collect();

        let state = self
            .categories
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(category)
            .cloned();
        if let Some(state) = state {
            let state = lock(&state);
            for (item, record) in &state.records {
                items.insert(item.clone(), record.clone());
            }
        }

        let total_uses = items.values().map(|r| r.usage_count).sum();
        CategoryStats {
            category: category.to_string(),
            items,
            total_uses,
        }
    }

    /// Forget all history for one category.
    pub fn reset_category(&self, category: &str) {
        self.categories
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(category);

        let prefix = format!("{category}:");
        let mut baseline = self.baseline.write().unwrap_or_else(|p| p.into_inner());
        // `intro:generic:x` belongs to category `intro:generic`, not `intro`
        baseline.records.retain(|key, _| {
            !key.strip_prefix(&prefix)
                .is_some_and(|item| !item.contains(':'))
        });
        baseline.sequence.remove(category);
        drop(baseline);

        info!("Reset rotation history for category {}", category);
        self.note_change();
    }

    /// Current state as it would be persisted
    pub fn snapshot(&self) -> RotationHistory {
        let mut history = self
            .baseline
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        let categories: Vec<(String, Arc<Mutex<CategoryState>>)> = self
            .categories
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|(name, state)| (name.clone(), Arc::clone(state)))
            .collect();
        for (category, state) in categories {
            let state = lock(&state);
            for (item, record) in &state.records {
                history
                    .records
                    .insert(history_key(&category, item), record.clone());
            }
            history.sequence.insert(category, state.sequence);
        }

        history.fragments = lock(&self.fragments).clone();
        history.updated_at = Some(Utc::now());
        history
    }

    /// Persist now, on the calling thread. Use at shutdown.
    pub fn flush(&self) -> Result<()> {
        self.pending.store(0, Ordering::SeqCst);
        let (generation, history) = self.numbered_snapshot();
        let mut written = lock(&self.written);
        self.store.save(&history)?;
        *written = (*written).max(generation);
        Ok(())
    }

    /// Number of changes not yet handed to a flush
    pub fn pending_changes(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn category(&self, category: &str) -> Arc<Mutex<CategoryState>> {
        if let Some(state) = self
            .categories
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(category)
        {
            return Arc::clone(state);
        }

        let mut categories = self.categories.write().unwrap_or_else(|p| p.into_inner());
        let state = categories.entry(category.to_string()).or_insert_with(|| {
            let sequence = self
                .baseline
                .read()
                .unwrap_or_else(|p| p.into_inner())
                .sequence
                .get(category)
                .copied()
                .unwrap_or(0);
            let rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed ^ stable_hash(category)),
                None => StdRng::from_os_rng(),
            };
            Arc::new(Mutex::new(CategoryState {
                records: BTreeMap::new(),
                sequence,
                rng,
            }))
        });
        Arc::clone(state)
    }

    fn current_record(&self, state: &CategoryState, category: &str, item: &str) -> UsageRecord {
        state.records.get(item).cloned().unwrap_or_else(|| {
            self.baseline
                .read()
                .unwrap_or_else(|p| p.into_inner())
                .record(category, item)
                .cloned()
                .unwrap_or_default()
        })
    }

    fn note_change(&self) {
        let batch = self.settings.flush_batch_size.max(1);
        if self.pending.fetch_add(1, Ordering::SeqCst) + 1 >= batch {
            self.pending.store(0, Ordering::SeqCst);
            self.flush_in_background();
        }
    }

    fn numbered_snapshot(&self) -> (u64, RotationHistory) {
        let _guard = lock(&self.snapshot_lock);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        (generation, self.snapshot())
    }

    fn flush_in_background(&self) {
        let (generation, history) = self.numbered_snapshot();
        let store = Arc::clone(&self.store);
        let written = Arc::clone(&self.written);

        let job = move || {
            let mut written = lock(&written);
            if generation <= *written {
                debug!(generation, "Skipping stale rotation flush");
                return;
            }
            match store.save(&history) {
                Ok(()) => *written = generation,
                Err(e) => warn!("Background rotation flush failed: {}", e),
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                std::thread::spawn(job);
            }
        }
    }
}
