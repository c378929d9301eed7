//! Ports layer for the deduplication engine.
//!
//! - Inbound (Driving) ports: API exposed to the network-ingestion layer
//! - Outbound (Driven) ports: clock

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
