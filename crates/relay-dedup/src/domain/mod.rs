//! # Domain Layer for P2P Deduplication
//!
//! Pure data and rules with no I/O and no locking.
//!
//! ## Contents
//!
//! - **entities**: `Entry`, `PeerReputation`, `MessageTypeStats`
//! - **value_objects**: `Tier`, `TierProfile`, `TrustLevel`, `DedupKey`, `DedupOptions`
//! - **config**: `DedupConfig` with validation
//! - **network**: per-network TTL/priority registry
//! - **invariants**: range and bound checks
//! - **errors**: `DedupError`

mod config;
mod entities;
mod errors;
mod invariants;
mod network;
mod value_objects;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use network::*;
pub use value_objects::*;
