//! # Eviction Policy
//!
//! FIFO for FREE/BUSINESS, lowest composite score for ENTERPRISE.

use crate::domain::{Entry, TierProfile, Timestamp, TrustLevel, MAX_PRIORITY, MIN_PRIORITY};

/// Which victim selection a tier uses, also the metric label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionPolicy {
    Fifo,
    Priority,
}

impl EvictionPolicy {
    pub fn for_profile(profile: &TierProfile) -> Self {
        if profile.priority_queuing {
            Self::Priority
        } else {
            Self::Fifo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::Priority => "priority",
        }
    }
}

/// Priority a message type earns before trust and caller adjustments.
pub fn base_priority(message_type: &str) -> i32 {
    match message_type {
        "block" | "NewBlock" => 10,
        "transaction" | "Transactions" => 7,
        "addr" | "getaddr" => 5,
        "ping" | "pong" => 1,
        _ => 3,
    }
}

/// Priority stored on a new entry.
///
/// `trust` is the inserting peer's trust level when reputation scoring
/// applies. A caller override replaces the computed value.
pub fn calculate_priority(
    profile: &TierProfile,
    message_type: &str,
    trust: Option<TrustLevel>,
    requested: Option<u8>,
) -> u8 {
    if !profile.priority_queuing {
        return MIN_PRIORITY;
    }

    let mut priority = base_priority(message_type);
    if let Some(level) = trust {
        priority += level.priority_adjustment();
    }
    if let Some(requested) = requested.filter(|p| *p > 0) {
        priority = i32::from(requested);
    }

    priority.clamp(i32::from(MIN_PRIORITY), i32::from(MAX_PRIORITY)) as u8
}

/// Retention score; the lowest-scoring entry is evicted first.
///
/// `peer_score` is the entry's peer reputation when reputation scoring
/// applies and the peer is still tracked.
pub fn eviction_score(
    entry: &Entry,
    profile: &TierProfile,
    peer_score: Option<f64>,
    now: Timestamp,
) -> f64 {
    let mut score = f64::from(entry.priority) * 10.0;

    if profile.confidence_scoring {
        score += entry.confidence * 5.0;
    }

    if let Some(peer_score) = peer_score {
        score += peer_score * 3.0;
    }

    score - entry.age_hours(now) * 0.1
}
