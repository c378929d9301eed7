//! # Gossip Scenarios
//!
//! Multi-network relay flows exercised end to end:
//!
//! 1. **Per-network scoping**: the same hash on two chains is two messages
//! 2. **Cross-network collapse**: ENTERPRISE relays a bridged message once
//! 3. **Flood containment**: a duplicate-spamming peer is latched out
//! 4. **Runtime tier change**: upgrades and downgrades keep the store consistent
//! 5. **Background maintenance**: expired entries leave without traffic
//! 6. **Anomaly reporting**: floods and velocity spikes are counted, never acted on
//! 7. **Observability**: counters reach the Prometheus registry

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use relay_dedup::{
        spawn_maintenance, DedupConfig, DedupOptions, Deduper, DeduplicationApi, MockTimeSource,
        NetworkConfig, SeenFilter, Tier, TrustLevel,
    };

    const T0: u64 = 1_700_000_000_000;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn mocked(config: DedupConfig) -> (Arc<Deduper>, Arc<MockTimeSource>) {
        let clock = Arc::new(MockTimeSource::new(T0));
        let dedup = Deduper::with_clock(config, clock.clone()).expect("valid config");
        (Arc::new(dedup), clock)
    }

    fn on(network: &str) -> DedupOptions {
        DedupOptions::new().with_source(network)
    }

    fn anomalies(kind: &str, tier: &str) -> f64 {
        relay_telemetry::ANOMALIES_DETECTED
            .with_label_values(&[kind, tier])
            .get()
    }

    /// Five types at 1 msg/s, then a burst type at 100 msg/s.
    /// Returns whether the burst's second message was reported as a duplicate.
    fn velocity_burst(dedup: &Deduper, clock: &MockTimeSource) -> bool {
        for kind in ["ping", "pong", "addr", "inv", "getdata"] {
            assert!(!dedup.is_duplicate(&format!("{}-a", kind), kind, "", &DedupOptions::new()));
            clock.advance(1_000);
            assert!(!dedup.is_duplicate(&format!("{}-b", kind), kind, "", &DedupOptions::new()));
        }

        dedup.is_duplicate("burst-a", "tx", "", &DedupOptions::new());
        clock.advance(10);
        dedup.is_duplicate("burst-b", "tx", "", &DedupOptions::new())
    }

    /// Ten rapid repeats, then a novel message from the same peer.
    /// Returns whether the novel message was reported as a duplicate.
    fn rapid_repeats(dedup: &Deduper, clock: &MockTimeSource) -> bool {
        dedup.is_duplicate("spam", "addr", "flooder", &DedupOptions::new());
        for _ in 0..10 {
            clock.advance(10);
            assert!(dedup.is_duplicate("spam", "addr", "flooder", &DedupOptions::new()));
        }
        clock.advance(10);
        dedup.is_duplicate("fresh", "addr", "flooder", &DedupOptions::new())
    }

    // =============================================================================
    // PER-NETWORK SCOPING
    // =============================================================================

    #[test]
    fn test_same_hash_on_different_chains_is_relayed_twice() {
        let dedup = Deduper::new("BUSINESS");

        assert!(!dedup.is_duplicate("0xabc", "transaction", "peer-a", &on("bitcoin")));
        assert!(!dedup.is_duplicate("0xabc", "transaction", "peer-a", &on("ethereum")));
        assert!(dedup.is_duplicate("0xabc", "transaction", "peer-a", &on("bitcoin")));

        let stats = dedup.get_stats();
        assert_eq!(stats.current_size, 2);
        assert_eq!(stats.message_types["transaction"].total_seen, 3);
        assert_eq!(stats.message_types["transaction"].duplicates, 1);
    }

    #[test]
    fn test_missing_source_is_the_unknown_network() {
        let dedup = Deduper::new("FREE");
        assert!(!dedup.is_duplicate("h", "tx", "", &DedupOptions::new()));
        assert!(dedup.is_duplicate("h", "tx", "", &on("unknown")));
        assert!(dedup.is_duplicate("h", "tx", "", &on("")));
    }

    // =============================================================================
    // CROSS-NETWORK COLLAPSE
    // =============================================================================

    #[test]
    fn test_enterprise_relays_bridged_message_once() {
        let dedup = Deduper::new("ENTERPRISE");

        assert!(!dedup.is_duplicate("bridge-1", "block", "btc-peer", &on("bitcoin")));
        assert!(dedup.is_duplicate("bridge-1", "NewBlock", "eth-peer", &on("ethereum")));
        assert!(dedup.is_duplicate("bridge-1", "slot", "sol-peer", &on("solana")));

        let stats = dedup.get_stats();
        assert_eq!(stats.current_size, 1);
        assert_eq!(stats.duplicates_found, 2);
        assert_eq!(stats.peers.len(), 3);
    }

    // =============================================================================
    // FLOOD CONTAINMENT
    // =============================================================================

    #[test]
    fn test_flooding_peer_is_latched_out() {
        let dedup = Deduper::new("BUSINESS");
        let opts = on("ethereum");

        dedup.is_duplicate("spam", "Transactions", "flooder", &opts);
        for _ in 0..200 {
            dedup.is_duplicate("spam", "Transactions", "flooder", &opts);
        }

        let stats = dedup.get_stats();
        let flooder = &stats.peers["flooder"];
        assert!(flooder.is_blacklisted);
        assert!(flooder.reputation_score < 0.1);
        assert_eq!(flooder.trust_level, TrustLevel::Low);
        assert!(flooder.blacklist_reason.is_some());

        // Novel traffic from the flooder is dropped, honest peers still relay
        assert!(dedup.is_duplicate("novel", "Transactions", "flooder", &opts));
        assert!(!dedup.is_duplicate("novel", "Transactions", "honest", &opts));
        assert_eq!(dedup.get_stats().peers["honest"].trust_level, TrustLevel::Trusted);
    }

    #[test]
    fn test_blacklist_survives_good_behaviour() {
        let dedup = Deduper::new("BUSINESS");
        dedup.is_duplicate("spam", "tx", "flooder", &DedupOptions::new());
        for _ in 0..200 {
            dedup.is_duplicate("spam", "tx", "flooder", &DedupOptions::new());
        }

        for i in 0..100 {
            assert!(dedup.is_duplicate(&format!("fresh-{}", i), "tx", "flooder", &DedupOptions::new()));
        }
        assert!(dedup.get_stats().peers["flooder"].is_blacklisted);
    }

    #[test]
    fn test_configured_trusted_peer() {
        let config = DedupConfig::for_tier(Tier::Business).with_network(
            NetworkConfig::new("polygon", Duration::from_secs(120), 1024 * 1024)
                .with_priority_messages(["checkpoint"])
                .with_trusted_peers(["validator-1"]),
        );
        let (dedup, _) = mocked(config);

        dedup.is_duplicate("cp", "checkpoint", "validator-1", &on("polygon"));
        assert_eq!(dedup.get_stats().peers["validator-1"].trust_level, TrustLevel::Trusted);
    }

    // =============================================================================
    // RUNTIME TIER CHANGE
    // =============================================================================

    #[test]
    fn test_upgrade_then_downgrade() {
        let dedup = Deduper::new("FREE");
        for i in 0..3_000 {
            dedup.is_duplicate(&format!("h{}", i), "tx", "", &DedupOptions::new());
        }

        dedup.set_tier("ENTERPRISE");
        let stats = dedup.get_stats();
        assert_eq!(stats.tier, Tier::Enterprise);
        assert_eq!(stats.capacity, 32_768);
        assert_eq!(stats.current_size, 3_000);
        // Shards stay as constructed
        assert_eq!(stats.shard_count, 16);

        for i in 3_000..6_000 {
            dedup.is_duplicate(&format!("h{}", i), "tx", "", &DedupOptions::new());
        }

        dedup.set_tier("FREE");
        let stats = dedup.get_stats();
        assert_eq!(stats.capacity, 4_096);
        assert_eq!(stats.current_size, 4_096);
        assert!(dedup.check_invariants().is_ok());
    }

    #[test]
    fn test_set_tier_is_case_insensitive() {
        let dedup = Deduper::new("free");
        assert_eq!(dedup.tier(), Tier::Free);
        dedup.set_tier("business");
        assert_eq!(dedup.tier(), Tier::Business);
        dedup.set_tier("Enterprise");
        assert_eq!(dedup.tier(), Tier::Enterprise);
    }

    // =============================================================================
    // BACKGROUND MAINTENANCE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_drops_expired_entries() {
        let config = DedupConfig::for_tier(Tier::Free)
            .with_ttl_bounds(Duration::from_secs(1), Duration::from_secs(600))
            .with_base_ttl(Duration::from_secs(30));
        let (dedup, clock) = mocked(config);

        for i in 0..50 {
            dedup.is_duplicate(&format!("h{}", i), "tx", "", &DedupOptions::new());
        }
        assert_eq!(dedup.len(), 50);

        let handle = spawn_maintenance(dedup.clone(), Duration::from_secs(10));

        clock.advance(31_000);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(dedup.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_keeps_live_entries() {
        let (dedup, clock) = mocked(DedupConfig::for_tier(Tier::Free));
        dedup.is_duplicate("h", "tx", "", &DedupOptions::new());

        let api: Arc<dyn DeduplicationApi> = dedup.clone();
        let handle = spawn_maintenance(api, Duration::from_secs(5));

        clock.advance(60_000);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(dedup.len(), 1);

        handle.shutdown().await;
    }

    // =============================================================================
    // SEEN FILTER
    // =============================================================================

    #[test]
    fn test_seen_filter_for_hash_only_callers() {
        let filter = SeenFilter::new(1_000, Duration::from_secs(120)).expect("valid filter");
        let hashes: Vec<String> = (0..100).map(|i| format!("{:064x}", i)).collect();

        for h in &hashes {
            assert!(!filter.seen(h));
        }
        for h in &hashes {
            assert!(filter.seen(h));
        }

        let stats = filter.engine().get_stats();
        assert_eq!(stats.current_ttl, Duration::from_secs(120));
        assert_eq!(stats.message_types["unknown"].total_seen, 200);
    }

    // =============================================================================
    // ANOMALY REPORTING
    // =============================================================================

    #[test]
    fn test_velocity_spike_is_counted() {
        let (dedup, clock) = mocked(DedupConfig::for_tier(Tier::Enterprise));
        let before = anomalies("velocity_spike", "ENTERPRISE");

        assert!(!velocity_burst(&dedup, &clock));
        assert!(anomalies("velocity_spike", "ENTERPRISE") >= before + 1.0);
    }

    #[test]
    fn test_flooding_peer_is_counted() {
        let (dedup, clock) = mocked(DedupConfig::for_tier(Tier::Enterprise));
        let before = anomalies("peer_flooding", "ENTERPRISE");

        assert!(!rapid_repeats(&dedup, &clock));
        assert!(anomalies("peer_flooding", "ENTERPRISE") >= before + 1.0);

        let flooder = dedup.peer("flooder").expect("tracked");
        assert!(!flooder.is_blacklisted);
    }

    #[test]
    fn test_free_tier_reports_no_anomalies() {
        let (dedup, clock) = mocked(DedupConfig::for_tier(Tier::Free));
        let spikes = anomalies("velocity_spike", "FREE");
        let floods = anomalies("peer_flooding", "FREE");

        assert!(!velocity_burst(&dedup, &clock));
        assert!(!rapid_repeats(&dedup, &clock));

        assert_eq!(anomalies("velocity_spike", "FREE"), spikes);
        assert_eq!(anomalies("peer_flooding", "FREE"), floods);
    }

    // =============================================================================
    // OBSERVABILITY
    // =============================================================================

    #[test]
    fn test_suppression_reaches_registry() {
        let dedup = Deduper::new("BUSINESS");
        dedup.is_duplicate("m", "addr", "p1", &on("bitcoin"));
        dedup.is_duplicate("m", "addr", "p1", &on("bitcoin"));

        let text = relay_telemetry::encode_metrics().expect("encode");
        assert!(text.contains("p2p_duplicates_suppressed_total"));
        assert!(text.contains("p2p_peer_reputation_score"));
        assert!(text.contains("p2p_adaptive_ttl_seconds"));
    }

    #[test]
    fn test_logging_installs_once_per_process() {
        let config = relay_telemetry::TelemetryConfig {
            json_logs: true,
            ..relay_telemetry::TelemetryConfig::for_component("p2p-dedup")
        };

        let guard = relay_telemetry::init_telemetry(&config);
        assert!(guard.is_ok());
        assert!(matches!(
            relay_telemetry::init_logging(&config),
            Err(relay_telemetry::TelemetryError::LoggingInit(_))
        ));

        // Engine logs now flow through the installed subscriber
        let dedup = Deduper::new("ENTERPRISE");
        dedup.set_tier("BUSINESS");
        assert!(dedup.close().is_ok());
    }

    #[test]
    fn test_stats_snapshot_as_json() {
        let dedup = Deduper::new("ENTERPRISE");
        dedup.is_duplicate("h", "block", "p1", &on("bitcoin"));
        dedup.is_duplicate("h", "block", "p2", &on("bitcoin"));

        let json = serde_json::to_value(dedup.get_stats()).expect("serialize");
        assert_eq!(json["tier"], "ENTERPRISE");
        assert_eq!(json["duplicates_found"], 1);
        assert_eq!(json["features"]["cross_network_dedup"], true);
        assert_eq!(json["message_types"]["block"]["duplicates"], 1);
        assert!(json["peers"]["p2"]["reputation_score"].as_f64().unwrap_or(1.0) < 1.0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let dedup = Deduper::new("ENTERPRISE");
        dedup.is_duplicate("h", "block", "p1", &DedupOptions::new());
        assert!(dedup.close().is_ok());
        assert!(dedup.close().is_ok());
        assert!(dedup.is_duplicate("h", "block", "p1", &DedupOptions::new()));
    }
}
