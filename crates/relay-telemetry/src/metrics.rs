//! Prometheus metrics for the P2P deduplication engine.
//!
//! All metrics follow the naming convention: `p2p_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., duplicates_suppressed_total)
//! - **Gauge**: Value that can go up or down (e.g., adaptive_ttl_seconds)
//!
//! Every metric carries a `tier` label so FREE/BUSINESS/ENTERPRISE engines in
//! the same process stay distinguishable.

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SUPPRESSION
    // =========================================================================

    /// Duplicate messages suppressed
    pub static ref DUPLICATES_SUPPRESSED: CounterVec = CounterVec::new(
        Opts::new("p2p_duplicates_suppressed_total", "Number of duplicate P2P messages suppressed"),
        &["message_type", "peer_type", "tier"]  // peer_type: duplicate/blacklisted
    ).expect("metric creation failed");

    /// Entries evicted at capacity
    pub static ref EVICTIONS: CounterVec = CounterVec::new(
        Opts::new("p2p_evictions_total", "Dedup entries evicted to stay within capacity"),
        &["policy", "tier"]  // policy: fifo/priority
    ).expect("metric creation failed");

    // =========================================================================
    // ADAPTIVE TTL
    // =========================================================================

    /// TTL adjustment events
    pub static ref TTL_ADJUSTMENTS: CounterVec = CounterVec::new(
        Opts::new("p2p_ttl_adjustments_total", "Number of TTL adjustments made for P2P deduplication"),
        &["direction", "tier"]  // direction: increase/decrease
    ).expect("metric creation failed");

    /// Current adaptive TTL ("global" or a message type)
    pub static ref ADAPTIVE_TTL: GaugeVec = GaugeVec::new(
        Opts::new("p2p_adaptive_ttl_seconds", "Current adaptive TTL for P2P deduplication"),
        &["message_type", "tier"]
    ).expect("metric creation failed");

    /// Current duplicate rate ("global" or a message type)
    pub static ref DUPLICATE_RATE: GaugeVec = GaugeVec::new(
        Opts::new("p2p_duplicate_rate", "Current duplicate rate for P2P messages"),
        &["message_type", "tier"]
    ).expect("metric creation failed");

    /// Messages per second per message type
    pub static ref MESSAGE_VELOCITY: GaugeVec = GaugeVec::new(
        Opts::new("p2p_message_velocity", "Messages per second for different message types"),
        &["message_type", "tier"]
    ).expect("metric creation failed");

    // =========================================================================
    // PEERS
    // =========================================================================

    /// Reputation score per peer
    pub static ref PEER_REPUTATION: GaugeVec = GaugeVec::new(
        Opts::new("p2p_peer_reputation_score", "Reputation score for P2P peers based on duplicate behavior"),
        &["peer_id", "tier"]
    ).expect("metric creation failed");

    /// Peers latched into the blacklist
    pub static ref PEERS_BLACKLISTED: CounterVec = CounterVec::new(
        Opts::new("p2p_peers_blacklisted_total", "Peers blacklisted for sustained duplicate flooding"),
        &["tier"]
    ).expect("metric creation failed");

    /// Advisory anomaly detections
    pub static ref ANOMALIES_DETECTED: CounterVec = CounterVec::new(
        Opts::new("p2p_anomalies_detected_total", "Anomalous P2P traffic patterns detected"),
        &["kind", "tier"]  // kind: peer_flooding/velocity_spike
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors that are already registered are
/// left in place.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Suppression
        Box::new(DUPLICATES_SUPPRESSED.clone()),
        Box::new(EVICTIONS.clone()),
        // Adaptive TTL
        Box::new(TTL_ADJUSTMENTS.clone()),
        Box::new(ADAPTIVE_TTL.clone()),
        Box::new(DUPLICATE_RATE.clone()),
        Box::new(MESSAGE_VELOCITY.clone()),
        // Peers
        Box::new(PEER_REPUTATION.clone()),
        Box::new(PEERS_BLACKLISTED.clone()),
        Box::new(ANOMALIES_DETECTED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
