//! # Anomaly Detection
//!
//! Advisory checks run after a decision has been made. Detections are only
//! logged and counted.

use crate::domain::PeerReputation;

/// Gap below which consecutive messages from a peer count as rapid fire.
pub const FLOOD_GAP_MS: u64 = 100;
/// Duplicate rate above which rapid fire counts as flooding.
pub const FLOOD_DUPLICATE_RATE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum Anomaly {
    PeerFlooding {
        peer_id: String,
        gap_ms: u64,
        duplicate_rate: f64,
    },
    VelocitySpike {
        message_type: String,
        velocity: f64,
        mean_velocity: f64,
    },
}

impl Anomaly {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PeerFlooding { .. } => "peer_flooding",
            Self::VelocitySpike { .. } => "velocity_spike",
        }
    }
}

/// Rapid-fire messages from a peer that is mostly sending duplicates.
pub fn detect_peer_flooding(peer: &PeerReputation) -> Option<Anomaly> {
    let gap_ms = peer.activity_gap()?;

    (gap_ms < FLOOD_GAP_MS && peer.duplicate_rate > FLOOD_DUPLICATE_RATE).then(|| {
        Anomaly::PeerFlooding {
            peer_id: peer.peer_id.clone(),
            gap_ms,
            duplicate_rate: peer.duplicate_rate,
        }
    })
}

/// A type whose velocity exceeds `threshold` times the mean of all positive
/// type velocities.
pub fn detect_velocity_spike<I>(
    message_type: &str,
    velocity: f64,
    all_velocities: I,
    threshold: f64,
) -> Option<Anomaly>
where
    I: IntoIterator<Item = f64>,
{
    if velocity <= 0.0 {
        return None;
    }

    let (sum, count) = all_velocities
        .into_iter()
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return None;
    }

    let mean_velocity = sum / count as f64;
    (velocity > mean_velocity * threshold).then(|| Anomaly::VelocitySpike {
        message_type: message_type.to_string(),
        velocity,
        mean_velocity,
    })
}
