//! Short-lived memoisation of radius and rectangle queries.
//!
//! Entries are keyed by the query kind, its parameters rounded to a
//! millimetre grid and the optional layer filter. An entry is served while
//! `now - computed_at < ttl`. The engine clears the whole cache on every
//! mutation, so the TTL only bounds staleness against position changes it
//! was never told about.

use acreage_core::id::EntityId;
use acreage_core::layer::LayerKind;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Parameters are stored as multiples of this.
const KEY_RESOLUTION: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Radius,
    Rect,
}

/// Canonical cache key for a spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    kind: QueryKind,
    params: [i64; 4],
    layer: Option<LayerKind>,
}

fn quantize(v: f64) -> i64 {
    (v / KEY_RESOLUTION).round() as i64
}

impl QueryKey {
    pub fn radius(cx: f64, cy: f64, radius: f64, layer: Option<LayerKind>) -> Self {
        Self {
            kind: QueryKind::Radius,
            params: [quantize(cx), quantize(cy), quantize(radius), 0],
            layer,
        }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64, layer: Option<LayerKind>) -> Self {
        Self {
            kind: QueryKind::Rect,
            params: [quantize(x), quantize(y), quantize(width), quantize(height)],
            layer,
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn layer(&self) -> Option<LayerKind> {
        self.layer
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: BTreeSet<EntityId>,
    computed_at: Duration,
}

#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A copy of the cached result if it is still within its TTL. Counts a
    /// hit or a miss either way.
    pub fn get(&mut self, key: &QueryKey, now: Duration) -> Option<BTreeSet<EntityId>> {
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| now.saturating_sub(entry.computed_at) < self.ttl)
            .map(|entry| entry.result.clone());
        match fresh {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        fresh
    }

    pub fn insert(&mut self, key: QueryKey, result: BTreeSet<EntityId>, now: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                computed_at: now,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries whose TTL has run out. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: Duration) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.computed_at) < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acreage_core::test_utils::make_entities;

    const TTL: Duration = Duration::from_millis(100);

    #[test]
    fn keys_round_to_resolution() {
        assert_eq!(
            QueryKey::radius(1.0, 2.0, 3.0, None),
            QueryKey::radius(1.0001, 1.9999, 3.0002, None)
        );
        assert_ne!(
            QueryKey::radius(1.0, 2.0, 3.0, None),
            QueryKey::radius(1.002, 2.0, 3.0, None)
        );
        assert_ne!(
            QueryKey::radius(1.0, 2.0, 3.0, None),
            QueryKey::radius(1.0, 2.0, 3.0, Some(LayerKind::Crops))
        );
        assert_ne!(
            QueryKey::rect(1.0, 2.0, 3.0, 0.0, None),
            QueryKey::radius(1.0, 2.0, 3.0, None)
        );
    }

    #[test]
    fn entries_expire_after_ttl() {
        let (_sm, ids) = make_entities(2);
        let mut cache = QueryCache::new(TTL);
        let key = QueryKey::rect(0.0, 0.0, 5.0, 5.0, None);
        let result = BTreeSet::from([ids[0], ids[1]]);

        assert!(cache.get(&key, Duration::ZERO).is_none());
        cache.insert(key, result.clone(), Duration::from_millis(10));

        assert_eq!(cache.get(&key, Duration::from_millis(109)), Some(result));
        assert!(cache.get(&key, Duration::from_millis(110)).is_none());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn hits_are_copies() {
        let (_sm, ids) = make_entities(1);
        let mut cache = QueryCache::new(TTL);
        let key = QueryKey::radius(0.0, 0.0, 1.0, None);
        cache.insert(key, BTreeSet::from([ids[0]]), Duration::ZERO);

        let mut first = cache.get(&key, Duration::ZERO).unwrap_or_default();
        first.clear();
        assert_eq!(cache.get(&key, Duration::ZERO).map(|s| s.len()), Some(1));
    }

    #[test]
    fn purge_and_clear() {
        let mut cache = QueryCache::new(TTL);
        cache.insert(QueryKey::radius(0.0, 0.0, 1.0, None), BTreeSet::new(), Duration::ZERO);
        cache.insert(
            QueryKey::radius(5.0, 0.0, 1.0, None),
            BTreeSet::new(),
            Duration::from_millis(80),
        );

        assert_eq!(cache.purge_expired(Duration::from_millis(150)), 1);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
