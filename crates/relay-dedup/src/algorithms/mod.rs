//! # Algorithms Module
//!
//! Online algorithms combined by the dedup pipeline. All functions are pure
//! and operate on domain values; locking happens in the service.

pub mod anomaly;
pub mod confidence;
pub mod eviction;
pub mod reputation;
pub mod ttl;
pub mod velocity;

pub use anomaly::{detect_peer_flooding, detect_velocity_spike, Anomaly};
pub use eviction::{base_priority, calculate_priority, eviction_score, EvictionPolicy};
pub use reputation::{apply_outcome, record_activity};
pub use ttl::{adjust_advanced, adjust_basic, type_ttl, Direction, TtlAdjustment};
pub use velocity::{record_size, update_velocity};
