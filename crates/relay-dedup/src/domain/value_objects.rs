//! # Domain Value Objects
//!
//! Tiers and their feature profiles, trust levels, per-call options and the
//! composite deduplication key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::entities::{MessageTypeStats, PeerReputation};
use super::errors::DedupError;

/// Service level gating which adaptive features are active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Free,
    Business,
    Enterprise,
}

impl Tier {
    /// Canonical upper-case name, also used as the `tier` metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Business => "BUSINESS",
            Self::Enterprise => "ENTERPRISE",
        }
    }

    /// Maximum number of tracked entries.
    pub fn capacity(&self) -> usize {
        match self {
            Self::Free => 4096,
            Self::Business => 16384,
            Self::Enterprise => 32768,
        }
    }

    /// Seed for the global adaptive TTL.
    pub fn base_ttl(&self) -> Duration {
        match self {
            Self::Free => Duration::from_secs(5 * 60),
            Self::Business => Duration::from_secs(10 * 60),
            Self::Enterprise => Duration::from_secs(15 * 60),
        }
    }

    /// Number of independently locked shards in the entry store.
    pub fn shard_count(&self) -> usize {
        match self {
            Self::Free => 16,
            Self::Business => 32,
            Self::Enterprise => 64,
        }
    }

    /// Parse a tier, falling back to FREE for anything unrecognised.
    pub fn parse_lenient(tier: &str) -> Self {
        tier.parse().unwrap_or_else(|_| {
            tracing::warn!(
                requested = tier,
                "[p2p-dedup] Unknown tier, falling back to FREE feature set"
            );
            Self::Free
        })
    }
}

impl FromStr for Tier {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "BUSINESS" => Ok(Self::Business),
            "ENTERPRISE" => Ok(Self::Enterprise),
            _ => Err(DedupError::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature flags resolved once per tier.
///
/// Hot paths branch on these booleans instead of comparing tier names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProfile {
    pub tier: Tier,
    pub peer_tracking: bool,
    pub cross_network_dedup: bool,
    pub reputation_scoring: bool,
    pub priority_queuing: bool,
    pub adaptive_learning: bool,
    pub confidence_scoring: bool,
    pub anomaly_detection: bool,
}

impl TierProfile {
    pub fn for_tier(tier: Tier) -> Self {
        let paid = matches!(tier, Tier::Business | Tier::Enterprise);
        let enterprise = tier == Tier::Enterprise;

        Self {
            tier,
            peer_tracking: paid,
            cross_network_dedup: enterprise,
            reputation_scoring: paid,
            priority_queuing: enterprise,
            adaptive_learning: enterprise,
            confidence_scoring: paid,
            anomaly_detection: enterprise,
        }
    }
}

impl From<Tier> for TierProfile {
    fn from(tier: Tier) -> Self {
        Self::for_tier(tier)
    }
}

/// Trust bucket derived from a peer's reputation score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustLevel {
    Low,
    Medium,
    High,
    Trusted,
}

impl TrustLevel {
    /// `>= 0.9` TRUSTED, `>= 0.7` HIGH, `>= 0.4` MEDIUM, else LOW.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::Trusted
        } else if score >= 0.7 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Priority bonus granted to entries inserted by a peer at this level.
    pub fn priority_adjustment(&self) -> i32 {
        match self {
            Self::Trusted => 3,
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Trusted => "TRUSTED",
        }
    }
}

/// Network name used when the caller does not supply a source.
pub const UNKNOWN_NETWORK: &str = "unknown";

/// Optional per-message metadata supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupOptions {
    /// Logical chain/network the message arrived on.
    pub source: Option<String>,
    /// Caller priority override (clamped to 1..=15 at insert).
    pub priority: Option<u8>,
    /// Message size in bytes.
    pub size: Option<u64>,
    /// Free-form metadata copied onto new entries.
    pub properties: HashMap<String, Value>,
}

impl DedupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Merge a batch of properties, later keys win.
    pub fn with_properties(mut self, properties: HashMap<String, Value>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Network the message belongs to (`"unknown"` without a source).
    pub fn network(&self) -> &str {
        match self.source.as_deref() {
            Some(source) if !source.is_empty() => source,
            _ => UNKNOWN_NETWORK,
        }
    }
}

/// Composite identity under which an entry is stored.
///
/// The shape depends on the active tier profile:
/// - cross-network dedup: the hash alone
/// - peer tracking: `network:type:peer:hash`
/// - otherwise: `network:type:hash`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Global {
        hash: String,
    },
    Peer {
        network: String,
        message_type: String,
        peer_id: String,
        hash: String,
    },
    Typed {
        network: String,
        message_type: String,
        hash: String,
    },
}

impl DedupKey {
    pub fn build(
        profile: &TierProfile,
        hash: &str,
        message_type: &str,
        peer_id: &str,
        network: &str,
    ) -> Self {
        if profile.cross_network_dedup {
            return Self::Global {
                hash: hash.to_owned(),
            };
        }

        if profile.peer_tracking && !peer_id.is_empty() {
            Self::Peer {
                network: network.to_owned(),
                message_type: message_type.to_owned(),
                peer_id: peer_id.to_owned(),
                hash: hash.to_owned(),
            }
        } else {
            Self::Typed {
                network: network.to_owned(),
                message_type: message_type.to_owned(),
                hash: hash.to_owned(),
            }
        }
    }

    pub fn hash(&self) -> &str {
        match self {
            Self::Global { hash } | Self::Peer { hash, .. } | Self::Typed { hash, .. } => hash,
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global { hash } => write!(f, "{}", hash),
            Self::Peer {
                network,
                message_type,
                peer_id,
                hash,
            } => write!(f, "{}:{}:{}:{}", network, message_type, peer_id, hash),
            Self::Typed {
                network,
                message_type,
                hash,
            } => write!(f, "{}:{}:{}", network, message_type, hash),
        }
    }
}

/// Inclusive TTL window every global and per-type TTL stays inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlBounds {
    pub min: Duration,
    pub max: Duration,
}

impl TtlBounds {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, ttl: Duration) -> Duration {
        ttl.clamp(self.min, self.max)
    }

    /// Clamp a fractional number of seconds, treating NaN as the lower bound.
    pub fn clamp_secs(&self, secs: f64) -> Duration {
        if !secs.is_finite() || secs <= 0.0 {
            return if secs == f64::INFINITY { self.max } else { self.min };
        }
        self.clamp(Duration::from_secs_f64(secs.min(self.max.as_secs_f64())))
    }

    pub fn contains(&self, ttl: Duration) -> bool {
        ttl >= self.min && ttl <= self.max
    }

    /// Widen the window so it includes `ttl`.
    pub fn including(self, ttl: Duration) -> Self {
        Self {
            min: self.min.min(ttl),
            max: self.max.max(ttl),
        }
    }
}

/// Point-in-time copy of engine state returned by `get_stats`.
#[derive(Clone, Debug, Serialize)]
pub struct StatsSnapshot {
    pub tier: Tier,
    pub total_seen: i64,
    pub duplicates_found: i64,
    pub global_duplicate_rate: f64,
    #[serde(with = "humantime_serde")]
    pub current_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub min_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,
    pub capacity: usize,
    pub current_size: usize,
    pub shard_count: usize,
    pub features: TierProfile,
    pub learning_rate: f64,
    pub confidence_threshold: f64,
    pub anomaly_threshold: f64,
    pub message_types: BTreeMap<String, MessageTypeStats>,
    pub peers: BTreeMap<String, PeerReputation>,
}
