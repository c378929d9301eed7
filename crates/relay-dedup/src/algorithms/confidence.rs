//! Confidence that an entry identifies a genuinely repeated message.

use crate::domain::{MAX_CONFIDENCE, MIN_CONFIDENCE};

const BASE: f64 = 0.7;
const LONG_HASH_LEN: usize = 32;
const LARGE_MESSAGE: u64 = 1024 * 1024;
const MAX_FREQUENCY_BOOST: f64 = 1.3;
const DECAY_WINDOW_MS: f64 = 2.0 * 3_600_000.0;

/// Confidence assigned when an entry is created or restarted.
///
/// `peer_score` is the inserting peer's reputation when reputation scoring
/// applies.
pub fn initial(hash: &str, message_type: &str, peer_score: Option<f64>, size: u64) -> f64 {
    let mut confidence = BASE;

    if hash.len() >= LONG_HASH_LEN {
        confidence += 0.1;
    }

    if let Some(score) = peer_score {
        confidence += score * 0.2;
    }

    confidence += match message_type {
        "block" | "NewBlock" => 0.1,
        "transaction" | "Transactions" => 0.05,
        "ping" | "pong" => -0.05,
        _ => 0.0,
    };

    if size > LARGE_MESSAGE {
        confidence += 0.05;
    }

    clamp(confidence)
}

/// Confidence after another sighting within TTL.
///
/// Repeats raise it (capped), age since `first_seen` decays it and a poor
/// peer drags it down.
pub fn updated(current: f64, seen_count: u64, since_first_ms: u64, peer_score: Option<f64>) -> f64 {
    let frequency_boost = (1.0 + seen_count as f64 * 0.01).min(MAX_FREQUENCY_BOOST);
    let time_decay = (-(since_first_ms as f64) / DECAY_WINDOW_MS).exp();
    let peer_influence = peer_score.map_or(1.0, |score| 0.5 + score * 0.5);

    clamp(current * frequency_boost * time_decay * peer_influence)
}

fn clamp(confidence: f64) -> f64 {
    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
