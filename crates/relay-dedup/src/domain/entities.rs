//! # Core Domain Entities
//!
//! - [`Entry`]: one tracked dedup key and its lifecycle counters
//! - [`PeerReputation`]: per-peer duplicate behaviour and trust
//! - [`MessageTypeStats`]: per message type counters, velocity and TTL

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::errors::Timestamp;
use super::value_objects::TrustLevel;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A tracked message identity.
///
/// Created on first sight, refreshed in place while within TTL, restarted when
/// re-observed after expiry and destroyed by cleanup or eviction.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub hash: String,
    pub message_type: String,
    /// Empty when the caller supplied no peer.
    pub peer_id: String,
    pub network: String,
    pub source: Option<String>,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub seen_count: u64,
    /// Always within [0.1, 1.0].
    pub confidence: f64,
    /// Always within [1, 15].
    pub priority: u8,
    pub size: u64,
    pub properties: HashMap<String, Value>,
    /// Global insertion sequence, mirrored in the owning shard's order index.
    pub seq: u64,
}

impl Entry {
    /// True while `now - last_seen` has not exceeded `ttl`.
    pub fn is_live(&self, now: Timestamp, ttl: Duration) -> bool {
        now.saturating_sub(self.last_seen) <= ttl.as_millis() as u64
    }

    /// Record another sighting within TTL.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_seen = now;
        self.seen_count += 1;
    }

    /// Restart the lifecycle after the entry expired but was not yet cleaned up.
    pub fn restart(&mut self, now: Timestamp, confidence: f64) {
        self.last_seen = now;
        self.seen_count = 1;
        self.confidence = confidence;
    }

    /// Hours since the entry was last seen.
    pub fn age_hours(&self, now: Timestamp) -> f64 {
        now.saturating_sub(self.last_seen) as f64 / MS_PER_HOUR
    }

    pub fn has_peer(&self) -> bool {
        !self.peer_id.is_empty()
    }
}

/// Reputation record for one peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerReputation {
    pub peer_id: String,
    pub total_messages: u64,
    pub duplicate_count: u64,
    pub duplicate_rate: f64,
    /// EMA in [0, 1], starts at 1.0.
    pub reputation_score: f64,
    pub trust_level: TrustLevel,
    /// Sticky once set.
    pub is_blacklisted: bool,
    pub blacklist_reason: Option<String>,
    pub last_activity: Timestamp,
    /// Activity timestamp before the most recent message.
    #[serde(skip)]
    pub previous_activity: Option<Timestamp>,
}

impl PeerReputation {
    pub fn new(peer_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            peer_id: peer_id.into(),
            total_messages: 0,
            duplicate_count: 0,
            duplicate_rate: 0.0,
            reputation_score: 1.0,
            trust_level: TrustLevel::Medium,
            is_blacklisted: false,
            blacklist_reason: None,
            last_activity: now,
            previous_activity: None,
        }
    }

    /// Milliseconds between the latest message and the one before it.
    pub fn activity_gap(&self) -> Option<u64> {
        self.previous_activity
            .map(|prev| self.last_activity.saturating_sub(prev))
    }

    pub fn is_idle(&self, now: Timestamp, window: Duration) -> bool {
        now.saturating_sub(self.last_activity) > window.as_millis() as u64
    }
}

/// Per message type statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageTypeStats {
    pub total_seen: u64,
    pub duplicates: u64,
    pub duplicate_rate: f64,
    /// Always within the engine's TTL bounds.
    #[serde(with = "humantime_serde")]
    pub adaptive_ttl: Duration,
    /// Set once the adaptive learner has computed a TTL for this type.
    pub ttl_adapted: bool,
    /// EMA of inter-arrival gaps.
    #[serde(with = "humantime_serde")]
    pub avg_time_between: Duration,
    pub last_seen: Option<Timestamp>,
    /// Messages per second.
    pub velocity: f64,
    /// EMA of supplied message sizes in bytes.
    pub average_size: f64,
}

impl MessageTypeStats {
    pub fn new(seed_ttl: Duration) -> Self {
        Self {
            total_seen: 0,
            duplicates: 0,
            duplicate_rate: 0.0,
            adaptive_ttl: seed_ttl,
            ttl_adapted: false,
            avg_time_between: Duration::ZERO,
            last_seen: None,
            velocity: 0.0,
            average_size: 0.0,
        }
    }

    pub fn record_seen(&mut self) {
        self.total_seen += 1;
        self.refresh_rate();
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
        self.refresh_rate();
    }

    fn refresh_rate(&mut self) {
        self.duplicate_rate = if self.total_seen > 0 {
            self.duplicates as f64 / self.total_seen as f64
        } else {
            0.0
        };
    }
}
