//! # Adapters Layer
//!
//! - **sharded_store**: lock-striped entry storage with global capacity
//! - **maintenance**: tokio task driving periodic cleanup
//! - **seen_filter**: hash-only facade over a FREE engine

pub mod maintenance;
pub mod seen_filter;
pub mod sharded_store;

pub use maintenance::{spawn_maintenance, MaintenanceHandle};
pub use seen_filter::SeenFilter;
pub use sharded_store::{Shard, ShardedEntryStore};
