use dashmap::DashMap;

use crate::data::AggregateEntry;

/// `floor((a + b) / 2)` without overflowing for any pair of i64 values.
pub fn halved_sum(a: i64, b: i64) -> i64 {
    (a >> 1) + (b >> 1) + (a & b & 1)
}

/// Per-action running averages.
///
/// Writes come only from the aggregator. Each update holds a single shard lock,
/// so readers see either the old or the new average, never a torn value.
#[derive(Debug, Default)]
pub struct AggregateTable {
    entries: DashMap<String, i64>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fold one measurement into the running average for `name`.
    ///
    /// The first measurement for a name seeds its average unchanged.
    /// Returns the new average.
    pub fn apply(&self, name: &str, value: i64) -> i64 {
        *self
            .entries
            .entry(name.to_string())
            .and_modify(|avg| *avg = halved_sum(*avg, value))
            .or_insert(value)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries.get(name).map(|avg| *avg)
    }

    /// Point-in-time copy of every entry, sorted by name.
    ///
    /// Locks are taken one shard at a time and released before returning.
    pub fn snapshot(&self) -> Vec<AggregateEntry> {
        let mut entries: Vec<AggregateEntry> = self
            .entries
            .iter()
            .map(|e| AggregateEntry::new(e.key().clone(), *e.value()))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Number of distinct action names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
