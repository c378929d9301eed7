//! # Engine Properties
//!
//! Randomised traffic against a mocked clock. Whatever the sequence of
//! messages, clock jumps, cleanups and tier switches, the engine stays within
//! its capacity, TTL bounds and score ranges. Peer scores only climb on
//! novel traffic and only fall on repeats.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use proptest::prelude::*;
    use relay_dedup::{DedupConfig, DedupOptions, Deduper, MockTimeSource, Tier};

    const TYPES: [&str; 5] = ["block", "transaction", "ping", "addr", "custom"];
    const NETWORKS: [&str; 4] = ["bitcoin", "ethereum", "solana", ""];
    const TIERS: [&str; 3] = ["FREE", "BUSINESS", "ENTERPRISE"];

    #[derive(Clone, Debug)]
    enum Op {
        Message {
            hash: u16,
            kind: usize,
            network: usize,
            peer: u8,
            size: u64,
        },
        Advance(u64),
        Cleanup,
        SetTier(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            8 => (0u16..300, 0..TYPES.len(), 0..NETWORKS.len(), 0u8..6, 0u64..4_000_000)
                .prop_map(|(hash, kind, network, peer, size)| Op::Message { hash, kind, network, peer, size }),
            2 => (0u64..90_000).prop_map(Op::Advance),
            1 => Just(Op::Cleanup),
            1 => (0..TIERS.len()).prop_map(Op::SetTier),
        ]
    }

    fn tier() -> impl Strategy<Value = Tier> {
        prop_oneof![Just(Tier::Free), Just(Tier::Business), Just(Tier::Enterprise)]
    }

    fn run(dedup: &Deduper, clock: &MockTimeSource, ops: &[Op]) {
        for op in ops {
            match op {
                Op::Message { hash, kind, network, peer, size } => {
                    let peer = if *peer == 0 { String::new() } else { format!("peer-{}", peer) };
                    let opts = DedupOptions::new()
                        .with_source(NETWORKS[*network])
                        .with_size(*size);
                    dedup.is_duplicate(&format!("{:08x}", hash), TYPES[*kind], &peer, &opts);
                }
                Op::Advance(ms) => clock.advance(*ms),
                Op::Cleanup => {
                    dedup.cleanup();
                }
                Op::SetTier(i) => dedup.set_tier(TIERS[*i]),
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_invariants_hold_under_random_traffic(
            start in tier(),
            capacity in 8usize..128,
            ops in prop::collection::vec(op(), 1..600),
        ) {
            let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
            let config = DedupConfig::for_tier(start)
                .with_capacity(capacity)
                .with_adjust_every(Duration::from_secs(30));
            let dedup = Deduper::with_clock(config, clock.clone()).expect("valid config");

            run(&dedup, &clock, &ops);

            prop_assert!(dedup.len() <= dedup.capacity());
            prop_assert_eq!(dedup.check_invariants(), Ok(()));

            let stats = dedup.get_stats();
            prop_assert!(stats.current_ttl >= stats.min_ttl && stats.current_ttl <= stats.max_ttl);
            prop_assert!(stats.duplicates_found <= stats.total_seen);
            for peer in stats.peers.values() {
                prop_assert!((0.0..=1.0).contains(&peer.reputation_score));
                prop_assert!(peer.duplicate_count <= peer.total_messages);
            }
        }

        #[test]
        fn prop_immediate_repeat_is_duplicate(
            start in tier(),
            hashes in prop::collection::hash_set("[a-f0-9]{8,64}", 1..50),
        ) {
            let clock = Arc::new(MockTimeSource::new(0));
            let dedup = Deduper::with_clock(DedupConfig::for_tier(start), clock)
                .expect("valid config");

            for h in &hashes {
                prop_assert!(!dedup.is_duplicate(h, "transaction", "", &DedupOptions::new()));
                prop_assert!(dedup.is_duplicate(h, "transaction", "", &DedupOptions::new()));
            }
        }

        #[test]
        fn prop_reputation_moves_with_behaviour(
            seeded in 1usize..64,
            steps in prop::collection::vec((any::<bool>(), 0usize..64, 0u64..500), 1..300),
        ) {
            let clock = Arc::new(MockTimeSource::new(1_700_000_000_000));
            let dedup = Deduper::with_clock(DedupConfig::for_tier(Tier::Enterprise), clock.clone())
                .expect("valid config");
            let opts = DedupOptions::new();

            // Anonymous relay seeds the hashes the echoing peer will repeat
            for i in 0..seeded {
                dedup.is_duplicate(&format!("seed-{}", i), "tx", "", &opts);
            }

            let mut honest_prev = 1.0;
            let mut echo_prev = 1.0;
            for (n, (honest, pick, advance_ms)) in steps.iter().enumerate() {
                clock.advance(*advance_ms);
                if *honest {
                    let hash = format!("novel-{}", n);
                    prop_assert!(!dedup.is_duplicate(&hash, "tx", "honest", &opts));
                    let score = dedup.peer("honest").expect("tracked").reputation_score;
                    prop_assert!(score >= honest_prev && score <= 1.0);
                    honest_prev = score;
                } else {
                    let hash = format!("seed-{}", pick % seeded);
                    prop_assert!(dedup.is_duplicate(&hash, "tx", "echo", &opts));
                    let score = dedup.peer("echo").expect("tracked").reputation_score;
                    prop_assert!(score <= echo_prev && score >= 0.0);
                    echo_prev = score;
                }
            }
        }

        #[test]
        fn prop_entries_expire_after_ttl(
            ttl_secs in 5u64..600,
            extra_ms in 1u64..60_000,
        ) {
            let clock = Arc::new(MockTimeSource::new(0));
            let config = DedupConfig::for_tier(Tier::Free).with_base_ttl(Duration::from_secs(ttl_secs));
            let dedup = Deduper::with_clock(config, clock.clone()).expect("valid config");

            prop_assert!(!dedup.is_duplicate("h", "tx", "", &DedupOptions::new()));
            clock.advance(ttl_secs * 1_000);
            prop_assert!(dedup.is_duplicate("h", "tx", "", &DedupOptions::new()));
            clock.advance(ttl_secs * 1_000 + extra_ms);
            prop_assert!(!dedup.is_duplicate("h", "tx", "", &DedupOptions::new()));
        }
    }
}
