//! Query and search statistics for the grid engine.
//!
//! [`GridStats`] is a snapshot: counters are accumulated by the engine as
//! queries and searches run, and the structural counts (tiles, regions,
//! active regions, stranded entities) are filled in when
//! [`GridEngine::stats`](crate::GridEngine::stats) is called.

use std::time::Duration;

/// Weight of the newest sample in the query latency average.
pub const LATENCY_SMOOTHING: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridStats {
    pub tiles: usize,
    pub regions: usize,
    pub active_regions: usize,
    /// Radius and rectangle queries answered, cached or not.
    pub queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Exponential moving average of uncached query latency.
    pub avg_query_time: Duration,
    pub last_query_time: Duration,
    pub paths_requested: u64,
    pub paths_found: u64,
    /// Total A* expansions across all searches.
    pub path_nodes_expanded: u64,
    pub regions_processed: u64,
    /// Entities currently stranded in any index.
    pub stranded: usize,
}

impl GridStats {
    /// Fold one computed query's latency into the moving average. The first
    /// sample seeds the average directly.
    pub fn record_query(&mut self, elapsed: Duration) {
        self.last_query_time = elapsed;
        if self.avg_query_time.is_zero() {
            self.avg_query_time = elapsed;
            return;
        }
        let prev = self.avg_query_time.as_nanos() as f64;
        let sample = elapsed.as_nanos() as f64;
        let next = prev + LATENCY_SMOOTHING * (sample - prev);
        self.avg_query_time = Duration::from_nanos(next.round() as u64);
    }

    /// Fraction of queries served from the cache, or 0 before any query.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
