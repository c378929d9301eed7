//! Deduplication engine configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use relay_dedup::{DedupConfig, Tier};
//! use std::time::Duration;
//!
//! let config = DedupConfig::for_tier(Tier::Business)
//!     .with_capacity(50_000)
//!     .with_base_ttl(Duration::from_secs(120));
//! config.validate().expect("Valid config");
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::errors::DedupError;
use super::network::NetworkConfig;
use super::value_objects::Tier;

/// Engine tuning knobs.
///
/// Capacity, base TTL and shard count default to the tier's values when left
/// unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub tier: Tier,
    /// Overrides the tier capacity
    pub capacity: Option<usize>,
    /// Overrides the tier base TTL
    #[serde(with = "humantime_serde")]
    pub base_ttl: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub min_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,
    /// Minimum interval between TTL adjustments
    #[serde(with = "humantime_serde")]
    pub adjust_every: Duration,
    /// EMA weight for reputation, velocity and adaptive TTL (0, 1]
    pub learning_rate: f64,
    /// Entries below this confidence get a shortened cleanup TTL
    pub confidence_threshold: f64,
    /// Velocity multiple of the mean that counts as a spike
    pub anomaly_threshold: f64,
    /// Idle window after which peer records are dropped
    #[serde(with = "humantime_serde")]
    pub reputation_decay: Duration,
    /// Overrides the tier shard count
    pub shard_count: Option<usize>,
    /// Networks registered on top of bitcoin/ethereum/solana
    pub networks: Vec<NetworkConfig>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            tier: Tier::Free,
            capacity: None,
            base_ttl: None,
            min_ttl: Duration::from_secs(5),
            max_ttl: Duration::from_secs(30 * 60),
            adjust_every: Duration::from_secs(60),
            learning_rate: 0.05,
            confidence_threshold: 0.75,
            anomaly_threshold: 3.0,
            reputation_decay: Duration::from_secs(24 * 60 * 60),
            shard_count: None,
            networks: Vec::new(),
        }
    }
}

impl DedupConfig {
    pub fn for_tier(tier: Tier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RELAY_DEDUP_TIER`: FREE, BUSINESS or ENTERPRISE (default: FREE)
    /// - `RELAY_DEDUP_CAPACITY`: Entry capacity override
    /// - `RELAY_DEDUP_BASE_TTL_SECS`: Base TTL override in seconds
    /// - `RELAY_DEDUP_SHARDS`: Shard count override
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let tier = env::var("RELAY_DEDUP_TIER")
            .map(|v| Tier::parse_lenient(&v))
            .unwrap_or_default();

        Self {
            tier,
            capacity: env::var("RELAY_DEDUP_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok()),
            base_ttl: env::var("RELAY_DEDUP_BASE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            shard_count: env::var("RELAY_DEDUP_SHARDS")
                .ok()
                .and_then(|v| v.parse().ok()),
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_base_ttl(mut self, ttl: Duration) -> Self {
        self.base_ttl = Some(ttl);
        self
    }

    pub fn with_ttl_bounds(mut self, min_ttl: Duration, max_ttl: Duration) -> Self {
        self.min_ttl = min_ttl;
        self.max_ttl = max_ttl;
        self
    }

    pub fn with_adjust_every(mut self, interval: Duration) -> Self {
        self.adjust_every = interval;
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_reputation_decay(mut self, window: Duration) -> Self {
        self.reputation_decay = window;
        self
    }

    pub fn with_shard_count(mut self, shards: usize) -> Self {
        self.shard_count = Some(shards);
        self
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.networks.push(network);
        self
    }

    pub fn effective_capacity(&self) -> usize {
        self.capacity.unwrap_or_else(|| self.tier.capacity())
    }

    pub fn effective_base_ttl(&self) -> Duration {
        self.base_ttl.unwrap_or_else(|| self.tier.base_ttl())
    }

    pub fn effective_shard_count(&self) -> usize {
        self.shard_count.unwrap_or_else(|| self.tier.shard_count())
    }

    /// Reject configurations the engine cannot honour.
    pub fn validate(&self) -> Result<(), DedupError> {
        if self.effective_capacity() == 0 {
            return Err(DedupError::InvalidConfig("capacity cannot be 0".into()));
        }

        if self.min_ttl.is_zero() {
            return Err(DedupError::InvalidConfig("min_ttl cannot be 0".into()));
        }

        if self.min_ttl > self.max_ttl {
            return Err(DedupError::InvalidConfig(format!(
                "min_ttl {:?} exceeds max_ttl {:?}",
                self.min_ttl, self.max_ttl
            )));
        }

        let base = self.effective_base_ttl();
        if base < self.min_ttl || base > self.max_ttl {
            return Err(DedupError::InvalidConfig(format!(
                "base_ttl {:?} outside [{:?}, {:?}]",
                base, self.min_ttl, self.max_ttl
            )));
        }

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(DedupError::InvalidConfig(
                "learning_rate must be in (0, 1]".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DedupError::InvalidConfig(
                "confidence_threshold must be in [0, 1]".into(),
            ));
        }

        if self.anomaly_threshold <= 0.0 {
            return Err(DedupError::InvalidConfig(
                "anomaly_threshold must be positive".into(),
            ));
        }

        if self.effective_shard_count() == 0 {
            return Err(DedupError::InvalidConfig("shard_count cannot be 0".into()));
        }

        if self.adjust_every.is_zero() {
            return Err(DedupError::InvalidConfig("adjust_every cannot be 0".into()));
        }

        Ok(())
    }
}
