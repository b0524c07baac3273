//! Cache Statistics Module
//!
//! Counters reported by the ARC and bloom layers.

use serde::Serialize;

// == Cache Stats ==
/// ARC layer performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a resident entry
    pub hits: u64,
    /// Lookups for keys the cache had never seen (or fully forgotten)
    pub misses: u64,
    /// Lookups that found only a ghost entry
    pub ghost_hits: u64,
    /// Resident entries pushed out by replacement
    pub evictions: u64,
    /// Current number of resident entries
    pub total_entries: usize,
    /// Entries seen once recently (T1)
    pub recent_entries: usize,
    /// Entries seen at least twice (T2)
    pub frequent_entries: usize,
    /// Adaptive target size of the recent list
    pub target_recent: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Ghost hits count as misses since they still reach the backing store.
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.ghost_hits;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_ghost_hit(&mut self) {
        self.ghost_hits += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    /// Updates the per-list sizes and the adaptive target.
    pub fn set_list_sizes(&mut self, recent: usize, frequent: usize, target_recent: usize) {
        self.recent_entries = recent;
        self.frequent_entries = frequent;
        self.target_recent = target_recent;
    }
}

// == Bloom Stats ==
/// Bloom layer metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BloomStats {
    /// Queries answered "definitely absent" without touching the store
    pub hits: u64,
    /// Queries seen while the filter was active
    pub total: u64,
    /// Keys added to the filter (warm-up and writes)
    pub elements_added: u64,
    /// Size of the bit array
    pub bits: usize,
    /// Hash functions per key
    pub hashes: u32,
    /// Whether warm-up has completed
    pub ready: bool,
}

impl BloomStats {
    /// Share of active queries the filter short-circuited.
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.ghost_hits, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_counts_ghosts_as_misses() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_ghost_hit();
        stats.record_ghost_hit();
        assert_eq!(stats.hit_rate(), 0.25);
    }

    #[test]
    fn test_record_eviction() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_eviction();
        assert_eq!(stats.evictions, 2);
    }

    #[test]
    fn test_set_list_sizes() {
        let mut stats = CacheStats::new();
        stats.set_total_entries(5);
        stats.set_list_sizes(2, 3, 1);
        assert_eq!(stats.total_entries, 5);
        assert_eq!(stats.recent_entries, 2);
        assert_eq!(stats.frequent_entries, 3);
        assert_eq!(stats.target_recent, 1);
    }

    #[test]
    fn test_bloom_hit_rate() {
        let stats = BloomStats {
            hits: 3,
            total: 4,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(BloomStats::default().hit_rate(), 0.0);
    }
}
