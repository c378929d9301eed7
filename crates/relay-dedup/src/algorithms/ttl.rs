//! # Adaptive TTL
//!
//! Feedback control of the suppression window against a target duplicate
//! rate. The basic controller nudges the global TTL in fixed steps; the
//! adaptive learner scales it proportionally and derives per-type TTLs.

use std::time::Duration;

use crate::domain::{MessageTypeStats, TtlBounds};

/// Duplicate rate the adaptive learner steers towards.
pub const TARGET_DUPLICATE_RATE: f64 = 0.25;
/// Samples needed before any adjustment is attempted.
pub const MIN_SAMPLES: i64 = 100;
/// Per-type samples needed before a type TTL is derived.
pub const MIN_TYPE_SAMPLES: u64 = 20;

const GLOBAL_GAIN: f64 = 1.5;
const SHRINK_FLOOR: Duration = Duration::from_secs(2 * 60);

/// Direction of a TTL change, used as the metric label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

/// New TTL plus the direction to report, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlAdjustment {
    pub ttl: Duration,
    pub direction: Option<Direction>,
}

/// Step controller for FREE and BUSINESS tiers.
///
/// | rate      | change                      | reported |
/// |-----------|-----------------------------|----------|
/// | > 0.40    | +30s                        | increase |
/// | > 0.20    | +15s                        | increase |
/// | < 0.05    | -15s, only above 2 minutes  | decrease |
/// | otherwise | +5s                         | -        |
pub fn adjust_basic(ttl: Duration, rate: f64, bounds: &TtlBounds) -> TtlAdjustment {
    let (next, direction) = if rate > 0.40 {
        (ttl + Duration::from_secs(30), Some(Direction::Increase))
    } else if rate > 0.20 {
        (ttl + Duration::from_secs(15), Some(Direction::Increase))
    } else if rate < 0.05 {
        if ttl > SHRINK_FLOOR {
            (ttl - Duration::from_secs(15), Some(Direction::Decrease))
        } else {
            (ttl, None)
        }
    } else {
        (ttl + Duration::from_secs(5), None)
    };

    TtlAdjustment {
        ttl: bounds.clamp(next),
        direction,
    }
}

/// Proportional controller for the global TTL.
pub fn adjust_advanced(
    ttl: Duration,
    rate: f64,
    learning_rate: f64,
    bounds: &TtlBounds,
) -> TtlAdjustment {
    let factor = 1.0 + (rate - TARGET_DUPLICATE_RATE) * learning_rate * GLOBAL_GAIN;
    let next = bounds.clamp_secs(ttl.as_secs_f64() * factor);

    let direction = match next.cmp(&ttl) {
        std::cmp::Ordering::Greater => Some(Direction::Increase),
        std::cmp::Ordering::Less => Some(Direction::Decrease),
        std::cmp::Ordering::Equal => None,
    };

    TtlAdjustment {
        ttl: next,
        direction,
    }
}

/// Per-type TTL derived from the (already adjusted) global TTL.
///
/// Returns `None` while the type has too few samples.
pub fn type_ttl(
    global_ttl: Duration,
    message_type: &str,
    stats: &MessageTypeStats,
    learning_rate: f64,
    bounds: &TtlBounds,
) -> Option<Duration> {
    if stats.total_seen <= MIN_TYPE_SAMPLES {
        return None;
    }

    let type_rate = stats.duplicates as f64 / stats.total_seen as f64;
    let mut factor = 1.0 + (type_rate - TARGET_DUPLICATE_RATE) * learning_rate;
    factor *= type_weight(message_type);

    Some(bounds.clamp_secs(global_ttl.as_secs_f64() * factor))
}

/// Blocks keep longer windows, control traffic shorter ones.
pub fn type_weight(message_type: &str) -> f64 {
    match message_type {
        "block" | "NewBlock" => 1.5,
        "ping" | "pong" => 0.5,
        _ => 1.0,
    }
}
