//! Invariants the engine maintains between calls.

use std::time::Duration;

use super::entities::{Entry, PeerReputation};
use super::value_objects::TtlBounds;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 15;

/// INVARIANT-1: TTL Bounds
/// Global and per-type TTLs never leave `[min_ttl, max_ttl]`.
pub fn invariant_ttl_within_bounds(ttl: Duration, bounds: &TtlBounds) -> bool {
    bounds.contains(ttl)
}

/// INVARIANT-2: Capacity
/// The store never holds more entries than its capacity.
pub fn invariant_capacity(len: usize, capacity: usize) -> bool {
    len <= capacity
}

/// INVARIANT-3: Entry Ranges
/// Confidence stays within [0.1, 1.0] and priority within [1, 15].
pub fn invariant_entry_ranges(entry: &Entry) -> bool {
    (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&entry.confidence)
        && (MIN_PRIORITY..=MAX_PRIORITY).contains(&entry.priority)
}

/// INVARIANT-4: Reputation Range
/// Reputation scores stay within [0, 1].
pub fn invariant_reputation_range(peer: &PeerReputation) -> bool {
    (0.0..=1.0).contains(&peer.reputation_score)
}

/// Invariant check result.
#[derive(Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    TtlOutOfBounds,
    OverCapacity,
    EntryOutOfRange,
    ReputationOutOfRange,
}
