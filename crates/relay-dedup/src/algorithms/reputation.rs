//! # Peer Reputation
//!
//! EMA scoring of peers from their duplicate ratio, with a sticky blacklist
//! latch for sustained flooders.

use crate::domain::{PeerReputation, Timestamp, TrustLevel};

/// Base penalty per duplicate, scaled by `1 + duplicate_rate`.
pub const DUPLICATE_PENALTY: f64 = 0.1;
/// Reward per novel message.
pub const NOVEL_REWARD: f64 = 0.02;

pub const BLACKLIST_MAX_SCORE: f64 = 0.1;
pub const BLACKLIST_MIN_DUPLICATE_RATE: f64 = 0.8;
pub const BLACKLIST_MIN_MESSAGES: u64 = 50;

pub const BLACKLIST_REASON: &str = "High duplicate rate with low reputation";

/// Count one message from the peer and roll its activity timestamps.
pub fn record_activity(peer: &mut PeerReputation, now: Timestamp) {
    if peer.total_messages > 0 {
        peer.previous_activity = Some(peer.last_activity);
    }
    peer.total_messages += 1;
    peer.last_activity = now;
    peer.duplicate_rate = duplicate_rate(peer);
}

/// Fold one dedup outcome into the peer's score.
///
/// Returns `true` only on the call that trips the blacklist latch.
pub fn apply_outcome(peer: &mut PeerReputation, is_duplicate: bool, alpha: f64) -> bool {
    if is_duplicate {
        peer.duplicate_count += 1;
    }
    peer.duplicate_rate = duplicate_rate(peer);

    let score = peer.reputation_score;
    let target = if is_duplicate {
        score - DUPLICATE_PENALTY * (1.0 + peer.duplicate_rate)
    } else {
        score + NOVEL_REWARD
    };
    peer.reputation_score = (score * (1.0 - alpha) + target * alpha).clamp(0.0, 1.0);
    peer.trust_level = TrustLevel::from_score(peer.reputation_score);

    if !peer.is_blacklisted && should_blacklist(peer) {
        peer.is_blacklisted = true;
        peer.blacklist_reason = Some(BLACKLIST_REASON.to_string());
        return true;
    }

    false
}

/// Low score, mostly duplicates, and enough history to judge.
pub fn should_blacklist(peer: &PeerReputation) -> bool {
    peer.reputation_score < BLACKLIST_MAX_SCORE
        && peer.duplicate_rate > BLACKLIST_MIN_DUPLICATE_RATE
        && peer.total_messages > BLACKLIST_MIN_MESSAGES
}

fn duplicate_rate(peer: &PeerReputation) -> f64 {
    if peer.total_messages == 0 {
        0.0
    } else {
        peer.duplicate_count as f64 / peer.total_messages as f64
    }
}
