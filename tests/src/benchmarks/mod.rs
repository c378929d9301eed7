//! # Relay Benchmarks
//!
//! Throughput of the dedup hot path per tier, under eviction pressure and
//! under thread contention.
