//! # Domain Errors
//!
//! The hot path (`is_duplicate`) never fails; errors only surface while
//! parsing tiers, validating configuration and shutting down.

use thiserror::Error;

/// Milliseconds since the Unix epoch, as produced by a [`TimeSource`](crate::ports::TimeSource).
pub type Timestamp = u64;

/// Deduplication engine errors.
#[derive(Debug, Error)]
pub enum DedupError {
    /// Tier string is not FREE, BUSINESS or ENTERPRISE.
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registration failed.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] relay_telemetry::TelemetryError),
}
