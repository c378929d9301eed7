//! # Relay Dedup
//!
//! Suppresses duplicate gossip messages arriving from many peers across
//! several blockchain networks, while scoring peers by how much duplicate
//! traffic they send.
//!
//! ## Architecture Role
//!
//! ```text
//! [Network receive loops] ──is_duplicate(hash, type, peer)──→ [Deduper]
//!                                                                │
//!                          ┌──────────────┬──────────────┬───────┴───────┐
//!                          ↓              ↓              ↓               ↓
//!                    [Entry shards]  [Type stats]  [Peer reputation] [Adaptive TTL]
//! ```
//!
//! ## Tiers
//!
//! | Tier       | Capacity | Base TTL | Shards | Features                                  |
//! |------------|----------|----------|--------|-------------------------------------------|
//! | FREE       | 4096     | 5 min    | 16     | type/network scoped keys, FIFO eviction   |
//! | BUSINESS   | 16384    | 10 min   | 32     | + peer keys, reputation, confidence       |
//! | ENTERPRISE | 32768    | 15 min   | 64     | + cross-network keys, priority eviction, adaptive learning, anomaly detection |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_dedup::{DedupOptions, Deduper};
//!
//! let dedup = Deduper::new("ENTERPRISE");
//! let opts = DedupOptions::new().with_source("bitcoin");
//! if !dedup.is_duplicate(&hash, "block", &peer_id, &opts) {
//!     relay(msg);
//! }
//! ```

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
mod service;

pub use adapters::{spawn_maintenance, MaintenanceHandle, SeenFilter};
pub use domain::{
    DedupConfig, DedupError, DedupKey, DedupOptions, Entry, InvariantViolation, MessageTypeStats,
    NetworkConfig, NetworkRegistry, PeerReputation, StatsSnapshot, Tier, TierProfile, Timestamp,
    TrustLevel, TtlBounds,
};
pub use ports::{CleanupStats, DeduplicationApi, SystemTimeSource, TimeSource};
pub use service::Deduper;

#[cfg(any(test, feature = "test-utils"))]
pub use ports::MockTimeSource;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
