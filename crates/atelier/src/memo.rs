//! Explicit memoisation of prepared pipeline data.
//!
//! The cache is an ordinary value owned by the caller. Entries are keyed by
//! a hash of the transactions, the horizon and the configuration, so a
//! changed input always builds afresh.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::{PreparedData, build_panel_and_train};
use atelier_data::{Transaction, TransactionTable};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

/// Cache of [`build_panel_and_train`] results.
#[derive(Debug, Default)]
pub struct MemoizedPipeline {
    cache: HashMap<u64, PreparedData>,
    hits: usize,
    misses: usize,
}

impl MemoizedPipeline {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepared data for these inputs, built on first request.
    pub fn prepare(
        &mut self,
        table: &TransactionTable,
        horizon: u32,
        config: &PipelineConfig,
    ) -> Result<&PreparedData> {
        let key = cache_key(table, horizon, config)?;
        match self.cache.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                debug!(key, "Prepared data cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                debug!(key, "Prepared data cache miss");
                let prepared = build_panel_and_train(table, horizon, config)?;
                Ok(entry.insert(prepared))
            }
        }
    }

    /// Lookups answered from the cache.
    pub const fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups that had to build.
    pub const fn misses(&self) -> usize {
        self.misses
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Hash of (transactions, horizon, config).
///
/// Floats hash by bit pattern, and the configuration by its JSON form.
pub fn cache_key(table: &TransactionTable, horizon: u32, config: &PipelineConfig) -> Result<u64> {
    let mut hasher = DefaultHasher::new();
    table.len().hash(&mut hasher);
    for tx in table {
        hash_transaction(tx, &mut hasher);
    }
    horizon.hash(&mut hasher);
    serde_json::to_string(config)?.hash(&mut hasher);
    Ok(hasher.finish())
}

fn hash_transaction(tx: &Transaction, hasher: &mut DefaultHasher) {
    tx.document_date.hash(hasher);
    tx.store_id.hash(hasher);
    tx.product_id.hash(hasher);
    tx.product_family.hash(hasher);
    tx.size.hash(hasher);
    for value in [tx.signed_quantity, tx.subtotal, tx.list_price, tx.unit_cost] {
        value.to_bits().hash(hasher);
    }
    tx.season_label.hash(hasher);
}
