// ============================================
// File: crates/lightwire-node/src/config.rs
// ============================================
//! # Node Configuration
//!
//! ## Creation Reason
//! Provides configuration management for a Lightwire node, loaded from
//! a TOML file.
//!
//! ## Main Functionality
//! - `NodeConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Default values for a local node
//!
//! ## Configuration Sections
//! - `network`: TCP listen address, dial timeout
//! - `noise`: handshake timeout, frame timeout, key rotation, message size
//! - `identity`: static key file path
//! - `limits`: peer count and event buffering
//! - `logging`: Log level
//! - `peers`: remote node ids and addresses to dial on startup
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "0.0.0.0:9735"
//! connect_timeout_secs = 10
//!
//! [noise]
//! handshake_timeout_secs = 30
//! frame_timeout_secs = 60
//! key_rotation = true
//! max_message_size = 65535
//!
//! [identity]
//! key_file = "/etc/lightwire/node_key.json"
//!
//! [limits]
//! max_peers = 125
//!
//! [[peers]]
//! node_id = "028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7"
//! addr = "203.0.113.7:9735"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - All config changes require node restart
//! - Validate config before node startup
//! - `max_message_size` can only lower the 65535 wire limit
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use lightwire_common::NodeId;
use lightwire_core::{KeyRotation, MAX_MESSAGE_SIZE};

use crate::error::{NodeError, Result};

// ============================================
// NodeConfig
// ============================================

/// Main node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Noise transport configuration.
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Static key configuration.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Peers dialed on startup.
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

impl NodeConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NodeError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| NodeError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if parsing or validation fails.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| NodeError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.noise.validate()?;
        self.limits.validate()?;

        for (i, peer) in self.peers.iter().enumerate() {
            if self.peers[..i].iter().any(|p| p.node_id == peer.node_id) {
                return Err(NodeError::config_invalid(
                    "peers",
                    format!("duplicate node_id {}", peer.node_id),
                ));
            }
        }

        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// TCP listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Outbound TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9735))
}

fn default_connect_timeout() -> u64 {
    10
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(NodeError::config_invalid(
                "network.connect_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Dial timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// ============================================
// NoiseConfig
// ============================================

/// Noise transport configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Deadline for the three-act handshake, in seconds.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Deadline for a frame body once its header arrived (0 disables).
    #[serde(default = "default_frame_timeout")]
    pub frame_timeout_secs: u64,

    /// Rotate keys every 1000 messages as BOLT8 peers expect.
    #[serde(default = "default_key_rotation")]
    pub key_rotation: bool,

    /// Largest accepted plaintext message.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_handshake_timeout() -> u64 {
    30
}

fn default_frame_timeout() -> u64 {
    60
}

fn default_key_rotation() -> bool {
    true
}

fn default_max_message_size() -> usize {
    MAX_MESSAGE_SIZE
}

impl NoiseConfig {
    fn validate(&self) -> Result<()> {
        if self.handshake_timeout_secs == 0 {
            return Err(NodeError::config_invalid(
                "noise.handshake_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.max_message_size == 0 {
            return Err(NodeError::config_invalid(
                "noise.max_message_size",
                "must be greater than 0",
            ));
        }

        if self.max_message_size > MAX_MESSAGE_SIZE {
            return Err(NodeError::config_invalid(
                "noise.max_message_size",
                format!("cannot exceed {MAX_MESSAGE_SIZE}"),
            ));
        }

        Ok(())
    }

    /// Handshake deadline.
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Frame body deadline, if enabled.
    #[must_use]
    pub const fn frame_timeout(&self) -> Option<Duration> {
        if self.frame_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.frame_timeout_secs))
        }
    }

    #[must_use]
    pub const fn rotation(&self) -> KeyRotation {
        KeyRotation::from_enabled(self.key_rotation)
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: default_handshake_timeout(),
            frame_timeout_secs: default_frame_timeout(),
            key_rotation: default_key_rotation(),
            max_message_size: default_max_message_size(),
        }
    }
}

// ============================================
// IdentityConfig
// ============================================

/// Static key configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path to key file.
    #[serde(default = "default_key_file")]
    pub key_file: String,
}

fn default_key_file() -> String {
    "/etc/lightwire/node_key.json".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
        }
    }
}

// ============================================
// LimitsConfig
// ============================================

/// Resource limits configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent peer connections.
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,

    /// Per-connection event channel capacity.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_peers() -> usize {
    125
}

fn default_event_buffer() -> usize {
    256
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.max_peers == 0 {
            return Err(NodeError::config_invalid(
                "limits.max_peers",
                "must be greater than 0",
            ));
        }

        if self.event_buffer == 0 {
            return Err(NodeError::config_invalid(
                "limits.event_buffer",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_peers: default_max_peers(),
            event_buffer: default_event_buffer(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// PeerConfig
// ============================================

/// A peer address record: who to dial and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Remote static public key.
    pub node_id: NodeId,
    /// Remote TCP address.
    pub addr: SocketAddr,
}

// ============================================
// Tests
// ============================================
