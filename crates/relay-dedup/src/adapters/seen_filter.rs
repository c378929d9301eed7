//! # Seen Filter
//!
//! Minimal "have I seen this hash" facade over a FREE-tier engine, for callers
//! that only deal in hashes.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{DedupConfig, DedupError, DedupOptions, Tier, TtlBounds};
use crate::ports::{CleanupStats, SystemTimeSource, TimeSource};
use crate::service::Deduper;

const LEGACY_SOURCE: &str = "legacy";
const LEGACY_TYPE: &str = "unknown";

/// Hash-only deduplication with a fixed capacity and TTL.
pub struct SeenFilter {
    engine: Deduper,
    options: DedupOptions,
}

impl SeenFilter {
    /// `capacity == 0` or a zero `ttl` keep the FREE tier defaults. A TTL
    /// outside the default bounds widens them.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, DedupError> {
        Self::with_clock(capacity, ttl, Arc::new(SystemTimeSource))
    }

    pub fn with_clock(
        capacity: usize,
        ttl: Duration,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, DedupError> {
        let mut config = DedupConfig::for_tier(Tier::Free);
        if capacity > 0 {
            config = config.with_capacity(capacity);
        }
        if !ttl.is_zero() {
            let bounds = TtlBounds::new(config.min_ttl, config.max_ttl).including(ttl);
            config = config
                .with_base_ttl(ttl)
                .with_ttl_bounds(bounds.min, bounds.max);
        }

        Ok(Self {
            engine: Deduper::with_clock(config, clock)?,
            options: DedupOptions::new().with_source(LEGACY_SOURCE),
        })
    }

    /// True if `hash` was already seen within the TTL.
    pub fn seen(&self, hash: &str) -> bool {
        self.engine
            .is_duplicate(hash, LEGACY_TYPE, "", &self.options)
    }

    pub fn cleanup(&self) -> CleanupStats {
        self.engine.cleanup()
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn engine(&self) -> &Deduper {
        &self.engine
    }
}
