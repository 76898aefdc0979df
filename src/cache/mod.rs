use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::physics::clearance::{ClearanceEvaluator, ClearanceResult, LinkGeometry, Obstacle};

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Exact bit patterns of every evaluator input. Two keys are equal only
/// when the evaluation would be bit-for-bit identical.
#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub struct ClearanceKey {
    pub distance_m: u64,
    pub frequency_hz: u64,
    pub tx_height_m: u64,
    pub rx_height_m: u64,
    pub obstacle_position_m: u64,
    pub obstacle_height_m: u64,
    pub obstacle_half_width_m: u64,
    pub use_curvature: bool,
    pub k_factor: u64,
    pub samples: usize,
}

impl ClearanceKey {
    pub fn new(
        evaluator: &ClearanceEvaluator,
        geometry: &LinkGeometry,
        obstacle: &Obstacle,
        use_curvature: bool,
    ) -> Self {
        Self {
            distance_m: geometry.distance_m.to_bits(),
            frequency_hz: geometry.frequency_hz.to_bits(),
            tx_height_m: geometry.tx_height_m.to_bits(),
            rx_height_m: geometry.rx_height_m.to_bits(),
            obstacle_position_m: obstacle.position_m.to_bits(),
            obstacle_height_m: obstacle.height_m.to_bits(),
            obstacle_half_width_m: obstacle.half_width_m.to_bits(),
            use_curvature,
            k_factor: evaluator.refraction.k_factor.to_bits(),
            samples: evaluator.samples,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    pub evaluations: u64,
    pub cache_hits: u64,
}

struct Inner {
    entries: LruCache<ClearanceKey, ClearanceResult>,
    metrics: CacheMetrics,
}

/// Remembers recent clearance results so a host re-evaluating every frame
/// only pays for the scan when an input actually changed.
pub struct ClearanceCache {
    inner: Mutex<Inner>,
}

impl Default for ClearanceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ClearanceCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                metrics: CacheMetrics::default(),
            }),
        }
    }

    // Results are plain data, a panic mid-insert cannot leave them torn.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &ClearanceKey) -> Option<ClearanceResult> {
        self.lock().entries.get(key).copied()
    }

    pub fn get_or_evaluate(
        &self,
        evaluator: &ClearanceEvaluator,
        geometry: &LinkGeometry,
        obstacle: &Obstacle,
        use_curvature: bool,
    ) -> ClearanceResult {
        let key = ClearanceKey::new(evaluator, geometry, obstacle, use_curvature);
        let mut inner = self.lock();
        if let Some(hit) = inner.entries.get(&key).copied() {
            inner.metrics.cache_hits = inner.metrics.cache_hits.saturating_add(1);
            trace!(?key, "clearance cache hit");
            return hit;
        }

        let result = evaluator.evaluate(geometry, obstacle, use_curvature);
        inner.metrics.evaluations = inner.metrics.evaluations.saturating_add(1);
        inner.entries.put(key, result);
        result
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.lock().metrics
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}
