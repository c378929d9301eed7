//! # Integration Tests
//!
//! Drive the dedup engine only through `relay_dedup`'s public surface.

pub mod concurrency;
pub mod properties;
pub mod scenarios;
