//! # Relay Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Throughput under contention and eviction pressure
//! │   └── dedup.rs
//! │
//! └── integration/      # Engine driven through its public API
//!     ├── scenarios.rs  # Multi-network gossip flows
//!     ├── concurrency.rs# Parallel receive loops
//!     └── properties.rs # Invariants under random traffic
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p relay-tests
//!
//! # By category
//! cargo test -p relay-tests integration::
//! cargo test -p relay-tests benchmarks::
//!
//! # Benchmarks
//! cargo bench -p relay-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
