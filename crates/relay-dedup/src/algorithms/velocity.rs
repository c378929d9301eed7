//! Per message type arrival velocity and size averages.

use std::time::Duration;

use crate::domain::{MessageTypeStats, Timestamp};

/// Fold one arrival into the type's inter-arrival EMA.
///
/// The first arrival only records `last_seen`. Returns the updated velocity
/// (messages per second) when one could be computed.
pub fn update_velocity(stats: &mut MessageTypeStats, now: Timestamp, alpha: f64) -> Option<f64> {
    let previous = stats.last_seen.replace(now)?;
    let gap = Duration::from_millis(now.saturating_sub(previous));

    stats.avg_time_between = if stats.avg_time_between.is_zero() {
        gap
    } else {
        Duration::from_secs_f64(
            stats.avg_time_between.as_secs_f64() * (1.0 - alpha) + gap.as_secs_f64() * alpha,
        )
    };

    if !stats.avg_time_between.is_zero() {
        stats.velocity = 1.0 / stats.avg_time_between.as_secs_f64();
    }

    Some(stats.velocity)
}

/// Fold a caller-supplied message size into the running average.
pub fn record_size(stats: &mut MessageTypeStats, size: u64, alpha: f64) {
    if size == 0 {
        return;
    }

    stats.average_size = if stats.average_size == 0.0 {
        size as f64
    } else {
        stats.average_size * (1.0 - alpha) + size as f64 * alpha
    };
}
