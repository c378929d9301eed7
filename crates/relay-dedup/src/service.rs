//! # Deduplication Service
//!
//! [`Deduper`] combines the sharded store, peer reputation, per-type
//! statistics, adaptive TTL, anomaly detection and eviction into a single
//! decision pipeline behind [`DeduplicationApi`].
//!
//! ## Thread Safety
//!
//! The engine is shared across network receive threads via `Arc`. Entries are
//! lock-striped by shard; type statistics and peer records each sit behind
//! their own `RwLock`. Nesting only ever follows this order: `set_tier` holds
//! the profile while evicting, and `peers` (read) is taken ahead of a shard
//! lock during priority eviction and the confidence update:
//!
//! ```text
//! profile -> types -> peers -> shard
//! ```
//!
//! ## Decision Pipeline (`is_duplicate`)
//!
//! 1. Empty hash: not a duplicate, no state change
//! 2. Bookkeeping: global counter, peer activity, type statistics
//! 3. Blacklisted peer: suppressed
//! 4. Shard lookup: live entry is a duplicate, expired entry restarts
//! 5. New key: evict at capacity, insert
//! 6. Tail: TTL adjustment when due, advisory anomaly detection

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use relay_telemetry::{
    log_event, log_peer_event, metric_inc, metric_set, ADAPTIVE_TTL, ANOMALIES_DETECTED,
    DUPLICATES_SUPPRESSED, DUPLICATE_RATE, EVICTIONS, MESSAGE_VELOCITY, PEERS_BLACKLISTED,
    PEER_REPUTATION, TTL_ADJUSTMENTS,
};

use crate::adapters::ShardedEntryStore;
use crate::algorithms::{
    self, confidence, reputation, ttl, velocity, Anomaly, EvictionPolicy,
};
use crate::domain::{
    invariant_capacity, invariant_entry_ranges, invariant_reputation_range,
    invariant_ttl_within_bounds, DedupConfig, DedupError, DedupKey, DedupOptions, Entry,
    InvariantViolation, MessageTypeStats, NetworkRegistry, PeerReputation, StatsSnapshot, Tier,
    TierProfile, Timestamp, TrustLevel, TtlBounds,
};
use crate::ports::{CleanupStats, DeduplicationApi, SystemTimeSource, TimeSource};

const SUBSYSTEM: &str = "p2p-dedup";

/// Insert attempts before a message is let through untracked.
const MAX_INSERT_ATTEMPTS: usize = 8;

/// Reputation below which an entry's cleanup TTL is scaled down.
const LOW_REPUTATION: f64 = 0.3;

/// Tuning parameters fixed at construction.
#[derive(Clone, Debug)]
struct EngineParams {
    bounds: TtlBounds,
    adjust_every_ms: u64,
    learning_rate: f64,
    confidence_threshold: f64,
    anomaly_threshold: f64,
    reputation_decay: Duration,
}

/// What the caller's peer looks like at decision time.
#[derive(Clone, Copy, Debug)]
struct PeerView {
    score: f64,
    trust: TrustLevel,
    blacklisted: bool,
}

/// One message moving through the pipeline.
struct Sighting<'a> {
    key: DedupKey,
    hash: &'a str,
    message_type: &'a str,
    peer_id: &'a str,
    network: &'a str,
    options: &'a DedupOptions,
    ttl: Duration,
    initial_confidence: f64,
    priority: u8,
}

/// Result of the shard lookup step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// Live entry, suppressed.
    Duplicate,
    /// Expired entry restarted in place.
    Refreshed,
    /// New entry stored.
    Inserted,
    /// No capacity slot could be won under contention.
    Dropped,
}

/// Sharded P2P deduplication and peer reputation engine.
pub struct Deduper {
    profile: RwLock<TierProfile>,
    store: ShardedEntryStore,
    types: RwLock<HashMap<String, MessageTypeStats>>,
    peers: RwLock<HashMap<String, PeerReputation>>,
    total_count: AtomicI64,
    dup_count: AtomicI64,
    /// Global TTL in milliseconds.
    ttl_ms: AtomicU64,
    last_adjust: AtomicU64,
    params: EngineParams,
    registry: NetworkRegistry,
    clock: Arc<dyn TimeSource>,
    closed: AtomicBool,
}

impl Deduper {
    /// Engine with the tier's defaults. Unknown tiers fall back to FREE.
    pub fn new(tier: &str) -> Self {
        if let Err(e) = relay_telemetry::register_metrics() {
            warn!(error = %e, "[p2p-dedup] Metrics registration failed");
        }
        let config = DedupConfig::for_tier(Tier::parse_lenient(tier));
        Self::build(config, Arc::new(SystemTimeSource))
    }

    /// Engine with an explicit, validated configuration.
    pub fn with_config(config: DedupConfig) -> Result<Self, DedupError> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Engine with an explicit configuration and clock.
    pub fn with_clock(config: DedupConfig, clock: Arc<dyn TimeSource>) -> Result<Self, DedupError> {
        config.validate()?;
        relay_telemetry::register_metrics()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: DedupConfig, clock: Arc<dyn TimeSource>) -> Self {
        let profile = TierProfile::for_tier(config.tier);
        let bounds = TtlBounds::new(config.min_ttl, config.max_ttl);
        let base_ttl = bounds.clamp(config.effective_base_ttl());
        let capacity = config.effective_capacity();

        let mut registry = NetworkRegistry::with_defaults();
        for network in &config.networks {
            registry.register(network.clone());
        }

        let now = clock.now();
        let engine = Self {
            profile: RwLock::new(profile),
            store: ShardedEntryStore::new(config.effective_shard_count(), capacity),
            types: RwLock::new(HashMap::new()),
            peers: RwLock::new(HashMap::new()),
            total_count: AtomicI64::new(0),
            dup_count: AtomicI64::new(0),
            ttl_ms: AtomicU64::new(base_ttl.as_millis() as u64),
            last_adjust: AtomicU64::new(now),
            params: EngineParams {
                bounds,
                adjust_every_ms: config.adjust_every.as_millis() as u64,
                learning_rate: config.learning_rate,
                confidence_threshold: config.confidence_threshold,
                anomaly_threshold: config.anomaly_threshold,
                reputation_decay: config.reputation_decay,
            },
            registry,
            clock,
            closed: AtomicBool::new(false),
        };

        metric_set!(ADAPTIVE_TTL, &["global", profile.tier.as_str()], base_ttl.as_secs_f64());

        info!(
            tier = %profile.tier,
            capacity = capacity,
            base_ttl_secs = base_ttl.as_secs_f64(),
            shards = engine.store.shard_count(),
            peer_tracking = profile.peer_tracking,
            reputation_scoring = profile.reputation_scoring,
            adaptive_learning = profile.adaptive_learning,
            "[p2p-dedup] Deduper initialized"
        );

        engine
    }

    // =========================================================================
    // DECISION PIPELINE
    // =========================================================================

    /// Decide whether a message was already seen within its TTL.
    pub fn is_duplicate(
        &self,
        hash: &str,
        message_type: &str,
        peer_id: &str,
        options: &DedupOptions,
    ) -> bool {
        if hash.is_empty() {
            return false;
        }

        let now = self.clock.now();
        let profile = *self.profile.read();
        let tier = profile.tier.as_str();
        let network = options.network();
        let size = options.size.unwrap_or(0);

        self.total_count.fetch_add(1, Ordering::Relaxed);

        let peer = (profile.peer_tracking && !peer_id.is_empty())
            .then(|| self.touch_peer(peer_id, now));
        let scored_peer = peer.filter(|_| profile.reputation_scoring);
        let blacklisted = scored_peer.map_or(false, |p| p.blacklisted);

        let (ttl, type_velocity) = {
            let mut types = self.types.write();
            let global = self.global_ttl();
            let stats = types
                .entry(message_type.to_owned())
                .or_insert_with(|| MessageTypeStats::new(global));
            stats.record_seen();
            velocity::record_size(stats, size, self.params.learning_rate);

            let type_velocity = if blacklisted {
                stats.record_duplicate();
                None
            } else {
                velocity::update_velocity(stats, now, self.params.learning_rate)
            };

            (self.resolve_ttl(stats, message_type, network), type_velocity)
        };

        if let Some(v) = type_velocity {
            metric_set!(MESSAGE_VELOCITY, &[message_type, tier], v);
        }

        if blacklisted {
            self.dup_count.fetch_add(1, Ordering::Relaxed);
            metric_inc!(DUPLICATES_SUPPRESSED, &[message_type, "blacklisted", tier]);
            return true;
        }

        let peer_score = scored_peer.map(|p| p.score);
        let initial_confidence = if profile.confidence_scoring {
            confidence::initial(hash, message_type, peer_score, size)
        } else {
            1.0
        };

        let sighting = Sighting {
            key: DedupKey::build(&profile, hash, message_type, peer_id, network),
            hash,
            message_type,
            peer_id,
            network,
            options,
            ttl,
            initial_confidence,
            priority: algorithms::calculate_priority(
                &profile,
                message_type,
                scored_peer.map(|p| p.trust),
                options.priority,
            ),
        };

        match self.lookup_or_insert(&profile, &sighting, now) {
            Outcome::Duplicate => {
                self.dup_count.fetch_add(1, Ordering::Relaxed);
                if let Some(stats) = self.types.write().get_mut(message_type) {
                    stats.record_duplicate();
                }
                if scored_peer.is_some() {
                    self.apply_reputation(peer_id, true, tier);
                }
                metric_inc!(DUPLICATES_SUPPRESSED, &[message_type, "duplicate", tier]);
                return true;
            }
            Outcome::Inserted => {
                if scored_peer.is_some() {
                    self.apply_reputation(peer_id, false, tier);
                }
            }
            Outcome::Refreshed => {}
            Outcome::Dropped => {
                debug!(
                    message_type = message_type,
                    "[p2p-dedup] Store saturated under contention, message not tracked"
                );
            }
        }

        self.maybe_adjust_ttl(now, &profile);

        if profile.anomaly_detection {
            self.detect_anomalies(message_type, peer_id, tier);
        }

        false
    }

    /// Shard lookup, refreshing or inserting under the shard write lock.
    fn lookup_or_insert(&self, profile: &TierProfile, sighting: &Sighting<'_>, now: Timestamp) -> Outcome {
        let mut pending: Option<Entry> = None;

        for _ in 0..MAX_INSERT_ATTEMPTS {
            {
                // Confidence follows the inserting peer's score; peers before shard
                let peers = (profile.confidence_scoring && profile.reputation_scoring)
                    .then(|| self.peers.read());
                let mut shard = self.store.shard_for(&sighting.key).write();

                if let Some(entry) = shard.get_mut(&sighting.key) {
                    if entry.is_live(now, sighting.ttl) {
                        entry.touch(now);
                        if profile.confidence_scoring {
                            let owner_score = peers
                                .as_ref()
                                .filter(|_| entry.has_peer())
                                .and_then(|p| p.get(&entry.peer_id))
                                .map(|p| p.reputation_score);
                            entry.confidence = confidence::updated(
                                entry.confidence,
                                entry.seen_count,
                                now.saturating_sub(entry.first_seen),
                                owner_score,
                            );
                        }
                        return Outcome::Duplicate;
                    }

                    entry.restart(now, sighting.initial_confidence);
                    return Outcome::Refreshed;
                }

                let entry = pending
                    .take()
                    .unwrap_or_else(|| Self::new_entry(sighting, now));
                match self.store.try_insert(&mut shard, sighting.key.clone(), entry) {
                    Ok(()) => return Outcome::Inserted,
                    Err(entry) => pending = Some(entry),
                }
            }

            // Shard lock released before evicting
            self.evict_one(profile);
        }

        Outcome::Dropped
    }

    fn new_entry(sighting: &Sighting<'_>, now: Timestamp) -> Entry {
        Entry {
            hash: sighting.hash.to_owned(),
            message_type: sighting.message_type.to_owned(),
            peer_id: sighting.peer_id.to_owned(),
            network: sighting.network.to_owned(),
            source: sighting.options.source.clone(),
            first_seen: now,
            last_seen: now,
            seen_count: 1,
            confidence: sighting.initial_confidence,
            priority: sighting.priority,
            size: sighting.options.size.unwrap_or(0),
            properties: sighting.options.properties.clone(),
            seq: 0,
        }
    }

    /// TTL governing a message type on a network.
    ///
    /// Once the adaptive learner has produced a type TTL it wins. Before that
    /// a network priority type uses the network base TTL, anything else the
    /// TTL seeded from the global one.
    fn resolve_ttl(&self, stats: &MessageTypeStats, message_type: &str, network: &str) -> Duration {
        if stats.ttl_adapted {
            return stats.adaptive_ttl;
        }

        self.registry
            .priority_ttl(network, message_type)
            .map(|ttl| self.params.bounds.clamp(ttl))
            .unwrap_or(stats.adaptive_ttl)
    }

    // =========================================================================
    // PEERS
    // =========================================================================

    /// Create the peer record if needed and count one message.
    fn touch_peer(&self, peer_id: &str, now: Timestamp) -> PeerView {
        let mut peers = self.peers.write();

        if let Some(peer) = peers.get_mut(peer_id) {
            reputation::record_activity(peer, now);
            return Self::view(peer);
        }

        let mut peer = PeerReputation::new(peer_id, now);
        if self.registry.is_trusted(peer_id) {
            peer.trust_level = TrustLevel::Trusted;
        }
        reputation::record_activity(&mut peer, now);
        let view = Self::view(&peer);
        peers.insert(peer_id.to_owned(), peer);
        view
    }

    fn view(peer: &PeerReputation) -> PeerView {
        PeerView {
            score: peer.reputation_score,
            trust: peer.trust_level,
            blacklisted: peer.is_blacklisted,
        }
    }

    fn apply_reputation(&self, peer_id: &str, is_duplicate: bool, tier: &str) {
        let (score, newly_blacklisted) = {
            let mut peers = self.peers.write();
            // Cleanup may have dropped the record since it was touched
            let Some(peer) = peers.get_mut(peer_id) else {
                return;
            };
            let tripped = reputation::apply_outcome(peer, is_duplicate, self.params.learning_rate);
            (peer.reputation_score, tripped.then(|| peer.duplicate_rate))
        };

        metric_set!(PEER_REPUTATION, &[peer_id, tier], score);

        if let Some(duplicate_rate) = newly_blacklisted {
            metric_inc!(PEERS_BLACKLISTED, &[tier]);
            log_peer_event!(
                warn,
                SUBSYSTEM,
                "[p2p-dedup] Peer blacklisted",
                peer_id,
                reputation = score,
                duplicate_rate = duplicate_rate,
                reason = reputation::BLACKLIST_REASON
            );
        }
    }

    /// Record activity for a peer outside the dedup path.
    pub fn track_peer(&self, peer_id: &str) {
        let tracking = self.profile.read().peer_tracking;
        if tracking && !peer_id.is_empty() {
            self.touch_peer(peer_id, self.clock.now());
        }
    }

    // =========================================================================
    // ADAPTIVE TTL
    // =========================================================================

    pub fn global_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms.load(Ordering::Acquire))
    }

    /// Run the TTL adjuster if an interval has elapsed. Only the thread that
    /// wins the `last_adjust` swap adjusts.
    fn maybe_adjust_ttl(&self, now: Timestamp, profile: &TierProfile) {
        let last = self.last_adjust.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.params.adjust_every_ms {
            return;
        }
        if self
            .last_adjust
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.adjust_ttl(profile);
    }

    fn adjust_ttl(&self, profile: &TierProfile) {
        let total = self.total_count.load(Ordering::Acquire);
        if total < ttl::MIN_SAMPLES {
            return;
        }

        let tier = profile.tier.as_str();
        let dups = self.dup_count.load(Ordering::Acquire);
        let rate = dups as f64 / total as f64;
        let current = self.global_ttl();
        let bounds = &self.params.bounds;
        let lr = self.params.learning_rate;

        let adjustment = if profile.adaptive_learning {
            ttl::adjust_advanced(current, rate, lr, bounds)
        } else {
            ttl::adjust_basic(current, rate, bounds)
        };
        self.ttl_ms
            .store(adjustment.ttl.as_millis() as u64, Ordering::Release);

        if let Some(direction) = adjustment.direction {
            metric_inc!(TTL_ADJUSTMENTS, &[direction.as_str(), tier]);
        }

        {
            let mut types = self.types.write();
            for (message_type, stats) in types.iter_mut() {
                let learned = if profile.adaptive_learning {
                    ttl::type_ttl(adjustment.ttl, message_type, stats, lr, bounds)
                } else {
                    None
                };

                match learned {
                    Some(type_ttl) => {
                        stats.adaptive_ttl = type_ttl;
                        stats.ttl_adapted = true;
                        metric_set!(DUPLICATE_RATE, &[message_type.as_str(), tier], stats.duplicate_rate);
                        metric_set!(ADAPTIVE_TTL, &[message_type.as_str(), tier], type_ttl.as_secs_f64());
                    }
                    // Types without their own TTL follow the global one
                    None if !stats.ttl_adapted => stats.adaptive_ttl = adjustment.ttl,
                    None => {}
                }
            }
        }

        metric_set!(ADAPTIVE_TTL, &["global", tier], adjustment.ttl.as_secs_f64());
        metric_set!(DUPLICATE_RATE, &["global", tier], rate);

        let _ = self
            .total_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(v / 2));
        let _ = self
            .dup_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(v / 2));

        debug!(
            tier = tier,
            duplicate_rate = rate,
            old_ttl_secs = current.as_secs_f64(),
            new_ttl_secs = adjustment.ttl.as_secs_f64(),
            "[p2p-dedup] TTL adjusted"
        );
    }

    // =========================================================================
    // ANOMALIES
    // =========================================================================

    fn detect_anomalies(&self, message_type: &str, peer_id: &str, tier: &str) {
        if !peer_id.is_empty() {
            let flooding = self
                .peers
                .read()
                .get(peer_id)
                .and_then(algorithms::detect_peer_flooding);
            if let Some(anomaly) = flooding {
                Self::report_anomaly(&anomaly, tier);
            }
        }

        let spike = {
            let types = self.types.read();
            types.get(message_type).and_then(|stats| {
                algorithms::detect_velocity_spike(
                    message_type,
                    stats.velocity,
                    types.values().map(|t| t.velocity),
                    self.params.anomaly_threshold,
                )
            })
        };
        if let Some(anomaly) = spike {
            Self::report_anomaly(&anomaly, tier);
        }
    }

    fn report_anomaly(anomaly: &Anomaly, tier: &str) {
        metric_inc!(ANOMALIES_DETECTED, &[anomaly.kind(), tier]);

        match anomaly {
            Anomaly::PeerFlooding {
                peer_id,
                gap_ms,
                duplicate_rate,
            } => {
                log_peer_event!(
                    warn,
                    SUBSYSTEM,
                    "[p2p-dedup] Potential P2P flooding detected",
                    peer_id,
                    gap_ms = *gap_ms,
                    duplicate_rate = *duplicate_rate
                );
            }
            Anomaly::VelocitySpike {
                message_type,
                velocity,
                mean_velocity,
            } => {
                warn!(
                    message_type = %message_type,
                    current_velocity = *velocity,
                    average_velocity = *mean_velocity,
                    "[p2p-dedup] Anomalous message velocity detected"
                );
            }
        }
    }

    // =========================================================================
    // EVICTION
    // =========================================================================

    fn evict_one(&self, profile: &TierProfile) -> Option<Entry> {
        let policy = EvictionPolicy::for_profile(profile);

        let evicted = match policy {
            EvictionPolicy::Fifo => self.store.evict_oldest(),
            EvictionPolicy::Priority => {
                let now = self.clock.now();
                let peers = self.peers.read();
                self.store.evict_lowest(|entry| {
                    let peer_score = (profile.reputation_scoring && entry.has_peer())
                        .then(|| peers.get(&entry.peer_id).map(|p| p.reputation_score))
                        .flatten();
                    algorithms::eviction_score(entry, profile, peer_score, now)
                })
            }
        };

        if let Some(entry) = &evicted {
            metric_inc!(EVICTIONS, &[policy.as_str(), profile.tier.as_str()]);
            debug!(
                policy = policy.as_str(),
                message_type = %entry.message_type,
                priority = entry.priority,
                "[p2p-dedup] Entry evicted"
            );
        }

        evicted
    }

    fn enforce_capacity(&self, profile: &TierProfile) {
        while self.store.is_over_capacity() {
            if self.evict_one(profile).is_none() && self.store.is_empty() {
                break;
            }
        }
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Drop expired entries and idle peer records.
    ///
    /// An entry's cleanup TTL is its type TTL, scaled by its confidence when
    /// below the confidence threshold and by its peer's score when that is
    /// below 0.3.
    pub fn cleanup(&self) -> CleanupStats {
        let now = self.clock.now();
        let profile = *self.profile.read();

        let type_ttls: HashMap<String, (Duration, bool)> = self
            .types
            .read()
            .iter()
            .map(|(name, stats)| (name.clone(), (stats.adaptive_ttl, stats.ttl_adapted)))
            .collect();
        let peer_scores: HashMap<String, f64> = if profile.reputation_scoring {
            self.peers
                .read()
                .iter()
                .map(|(id, peer)| (id.clone(), peer.reputation_score))
                .collect()
        } else {
            HashMap::new()
        };
        let global = self.global_ttl();
        let threshold = self.params.confidence_threshold;

        let entries_removed = self.store.retain(|entry| {
            let base = match type_ttls.get(&entry.message_type) {
                Some((adaptive, true)) => *adaptive,
                Some((adaptive, false)) => self
                    .registry
                    .priority_ttl(&entry.network, &entry.message_type)
                    .map(|ttl| self.params.bounds.clamp(ttl))
                    .unwrap_or(*adaptive),
                None => global,
            };

            let mut ttl_ms = base.as_millis() as f64;
            if profile.confidence_scoring && entry.confidence < threshold {
                ttl_ms *= entry.confidence;
            }
            if profile.reputation_scoring && entry.has_peer() {
                if let Some(score) = peer_scores.get(&entry.peer_id) {
                    if *score < LOW_REPUTATION {
                        ttl_ms *= score;
                    }
                }
            }

            now.saturating_sub(entry.last_seen) as f64 <= ttl_ms
        });

        let peers_removed = {
            let mut peers = self.peers.write();
            let before = peers.len();
            peers.retain(|_, peer| !peer.is_idle(now, self.params.reputation_decay));
            before - peers.len()
        };

        if entries_removed > 0 || peers_removed > 0 {
            debug!(
                entries_removed = entries_removed,
                entries_remaining = self.store.len(),
                peers_removed = peers_removed,
                peers_tracked = self.peers.read().len(),
                tier = %profile.tier,
                "[p2p-dedup] Cleanup completed"
            );
        }

        CleanupStats {
            entries_removed,
            peers_removed,
        }
    }

    /// Swap the feature profile and capacity, evicting down to the new
    /// capacity. The shard count stays as constructed.
    pub fn set_tier(&self, tier: &str) {
        let tier = Tier::parse_lenient(tier);
        let profile = TierProfile::for_tier(tier);

        let capacity = tier.capacity();
        let old_tier = {
            // Held until the store matches the new profile
            let mut current = self.profile.write();
            let old = current.tier;
            *current = profile;
            self.store.set_capacity(capacity);
            self.enforce_capacity(&profile);
            old
        };

        log_event!(
            info,
            SUBSYSTEM,
            "[p2p-dedup] Tier updated",
            old_tier = %old_tier,
            new_tier = %tier,
            new_capacity = capacity
        );
    }

    /// Point-in-time copy of counters, TTLs and statistics.
    pub fn get_stats(&self) -> StatsSnapshot {
        let profile = *self.profile.read();
        let total_seen = self.total_count.load(Ordering::Acquire);
        let duplicates_found = self.dup_count.load(Ordering::Acquire);
        let global_duplicate_rate = if total_seen > 0 {
            duplicates_found as f64 / total_seen as f64
        } else {
            0.0
        };

        let message_types: BTreeMap<String, MessageTypeStats> = self
            .types
            .read()
            .iter()
            .map(|(name, stats)| (name.clone(), stats.clone()))
            .collect();
        let peers: BTreeMap<String, PeerReputation> = self
            .peers
            .read()
            .iter()
            .map(|(id, peer)| (id.clone(), peer.clone()))
            .collect();

        StatsSnapshot {
            tier: profile.tier,
            total_seen,
            duplicates_found,
            global_duplicate_rate,
            current_ttl: self.global_ttl(),
            min_ttl: self.params.bounds.min,
            max_ttl: self.params.bounds.max,
            capacity: self.store.capacity(),
            current_size: self.store.len(),
            shard_count: self.store.shard_count(),
            features: profile,
            learning_rate: self.params.learning_rate,
            confidence_threshold: self.params.confidence_threshold,
            anomaly_threshold: self.params.anomaly_threshold,
            message_types,
            peers,
        }
    }

    /// End the lifecycle. Later calls are still answered.
    pub fn close(&self) -> Result<(), DedupError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        info!(
            tier = %self.tier(),
            total_processed = self.total_count.load(Ordering::Acquire),
            duplicates_found = self.dup_count.load(Ordering::Acquire),
            peers_tracked = self.peers.read().len(),
            "[p2p-dedup] Deduper shutdown"
        );
        Ok(())
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn tier(&self) -> Tier {
        self.profile.read().tier
    }

    pub fn profile(&self) -> TierProfile {
        *self.profile.read()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn peer(&self, peer_id: &str) -> Option<PeerReputation> {
        self.peers.read().get(peer_id).cloned()
    }

    /// Verify TTL bounds, capacity and value ranges across all state.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let bounds = &self.params.bounds;

        if !invariant_ttl_within_bounds(self.global_ttl(), bounds)
            || !self
                .types
                .read()
                .values()
                .all(|stats| invariant_ttl_within_bounds(stats.adaptive_ttl, bounds))
        {
            return Err(InvariantViolation::TtlOutOfBounds);
        }

        if !invariant_capacity(self.store.len(), self.store.capacity())
            || !invariant_capacity(self.store.counted_len(), self.store.capacity())
        {
            return Err(InvariantViolation::OverCapacity);
        }

        let mut entries_ok = true;
        self.store.for_each(|entry| entries_ok &= invariant_entry_ranges(entry));
        if !entries_ok {
            return Err(InvariantViolation::EntryOutOfRange);
        }

        if !self.peers.read().values().all(invariant_reputation_range) {
            return Err(InvariantViolation::ReputationOutOfRange);
        }

        Ok(())
    }
}

impl DeduplicationApi for Deduper {
    fn is_duplicate(
        &self,
        hash: &str,
        message_type: &str,
        peer_id: &str,
        options: &DedupOptions,
    ) -> bool {
        Deduper::is_duplicate(self, hash, message_type, peer_id, options)
    }

    fn track_peer(&self, peer_id: &str) {
        Deduper::track_peer(self, peer_id)
    }

    fn cleanup(&self) -> CleanupStats {
        Deduper::cleanup(self)
    }

    fn set_tier(&self, tier: &str) {
        Deduper::set_tier(self, tier)
    }

    fn get_stats(&self) -> StatsSnapshot {
        Deduper::get_stats(self)
    }

    fn close(&self) -> Result<(), DedupError> {
        Deduper::close(self)
    }
}
