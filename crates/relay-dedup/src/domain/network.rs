//! # Network Configuration Registry
//!
//! Per-network base TTL, size limits, priority message types and trusted
//! peers. Read-only once the engine is constructed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Static description of one supported chain network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network: String,
    #[serde(with = "humantime_serde")]
    pub base_ttl: Duration,
    /// Largest message accepted on this network, in bytes.
    pub max_message_size: u64,
    /// Message types that seed their TTL from `base_ttl`.
    #[serde(default)]
    pub priority_messages: Vec<String>,
    /// Peers that start out TRUSTED instead of MEDIUM.
    #[serde(default)]
    pub trusted_peers: Vec<String>,
}

impl NetworkConfig {
    pub fn new(network: impl Into<String>, base_ttl: Duration, max_message_size: u64) -> Self {
        Self {
            network: network.into(),
            base_ttl,
            max_message_size,
            priority_messages: Vec::new(),
            trusted_peers: Vec::new(),
        }
    }

    pub fn with_priority_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority_messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trusted_peers<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_peers = peers.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_priority(&self, message_type: &str) -> bool {
        self.priority_messages.iter().any(|m| m == message_type)
    }

    pub fn is_trusted(&self, peer_id: &str) -> bool {
        self.trusted_peers.iter().any(|p| p == peer_id)
    }

    pub fn bitcoin() -> Self {
        Self::new("bitcoin", Duration::from_secs(12 * 60), 4 * 1024 * 1024)
            .with_priority_messages(["block", "transaction", "addr"])
    }

    pub fn ethereum() -> Self {
        Self::new("ethereum", Duration::from_secs(3 * 60), 2 * 1024 * 1024)
            .with_priority_messages(["NewBlock", "NewBlockHashes", "Transactions"])
    }

    pub fn solana() -> Self {
        Self::new("solana", Duration::from_secs(60), 1024 * 1024)
            .with_priority_messages(["slot", "block", "shred"])
    }
}

/// Lookup table of known networks keyed by name.
#[derive(Clone, Debug)]
pub struct NetworkRegistry {
    networks: HashMap<String, NetworkConfig>,
}

impl NetworkRegistry {
    /// Registry without any networks.
    pub fn empty() -> Self {
        Self {
            networks: HashMap::new(),
        }
    }

    /// Registry preloaded with bitcoin, ethereum and solana.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(NetworkConfig::bitcoin());
        registry.register(NetworkConfig::ethereum());
        registry.register(NetworkConfig::solana());
        registry
    }

    /// Add or replace a network by name.
    pub fn register(&mut self, config: NetworkConfig) {
        self.networks.insert(config.network.clone(), config);
    }

    pub fn get(&self, network: &str) -> Option<&NetworkConfig> {
        self.networks.get(network)
    }

    /// Base TTL of `network` when it lists `message_type` as a priority message.
    pub fn priority_ttl(&self, network: &str, message_type: &str) -> Option<Duration> {
        self.get(network)
            .filter(|cfg| cfg.is_priority(message_type))
            .map(|cfg| cfg.base_ttl)
    }

    /// True when any registered network trusts the peer.
    pub fn is_trusted(&self, peer_id: &str) -> bool {
        self.networks.values().any(|cfg| cfg.is_trusted(peer_id))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
