//! # Inbound Port - DeduplicationApi
//!
//! Driving port used by the network-ingestion layer. Receive loops hold an
//! `Arc<dyn DeduplicationApi>` and call it from many threads at once.

use crate::domain::{DedupError, DedupOptions, StatsSnapshot};

/// Entries and peer records removed by one cleanup pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub entries_removed: usize,
    pub peers_removed: usize,
}

/// Primary API of the deduplication engine.
///
/// # Example
///
/// ```rust,ignore
/// use relay_dedup::{DedupOptions, DeduplicationApi};
///
/// fn on_message(dedup: &dyn DeduplicationApi, hash: &str, peer: &str) {
///     let opts = DedupOptions::new().with_source("bitcoin").with_size(512);
///     if !dedup.is_duplicate(hash, "transaction", peer, &opts) {
///         // propagate onward
///     }
/// }
/// ```
pub trait DeduplicationApi: Send + Sync {
    /// Decide whether a message was already seen within its TTL.
    ///
    /// Never fails: an empty hash is never a duplicate, unknown message
    /// types are tracked lazily and a full store evicts instead of rejecting.
    fn is_duplicate(
        &self,
        hash: &str,
        message_type: &str,
        peer_id: &str,
        options: &DedupOptions,
    ) -> bool;

    /// Record activity for a peer outside the dedup path.
    fn track_peer(&self, peer_id: &str);

    /// Drop expired entries and idle peer records.
    fn cleanup(&self) -> CleanupStats;

    /// Swap the feature profile and capacity. Unknown tiers fall back to FREE.
    fn set_tier(&self, tier: &str);

    /// Copy of the current counters, TTLs and per-type/per-peer statistics.
    fn get_stats(&self) -> StatsSnapshot;

    /// End the engine lifecycle. Idempotent.
    fn close(&self) -> Result<(), DedupError>;
}
