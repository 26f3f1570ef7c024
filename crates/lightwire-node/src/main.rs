// ============================================
// File: crates/lightwire-node/src/main.rs
// ============================================
//! # Lightwire Node Entry Point
//!
//! ## Creation Reason
//! Binary wrapper around the node library: CLI parsing, logging setup,
//! key management and node execution.
//!
//! ## Usage
//! ```bash
//! # Step 1: Create the node key
//! lightwire-node keygen
//!
//! # Step 2: Start the node
//! lightwire-node start
//!
//! # Other commands
//! lightwire-node pubkey              # Print the node id
//! lightwire-node validate            # Validate config file
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides the configured log level
//! - Logging is initialized once, after the config is loaded; nothing may
//!   log before `init_logging`
//! - `keygen` refuses to overwrite an existing key without `--force`
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lightwire_core::StaticKeyPair;
use lightwire_node::identity::{load_key, save_key};
use lightwire_node::{Node, NodeConfig};

// ============================================
// CLI Definition
// ============================================

/// Lightwire node: encrypted peer transport
#[derive(Parser, Debug)]
#[command(name = "lightwire-node")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the node
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/lightwire/node.toml")]
        config: PathBuf,
    },

    /// Generate a new node key
    Keygen {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/lightwire/node.toml")]
        config: PathBuf,

        /// Write the key here instead of the configured key file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Print the node id (compressed public key, hex)
    Pubkey {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/lightwire/node.toml")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/lightwire/node.toml")]
        config: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Self::Start { config }
            | Self::Keygen { config, .. }
            | Self::Pubkey { config }
            | Self::Validate { config } => config,
        }
    }
}

/// Level used until a config has been read.
const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = cli.command.config_path().to_path_buf();
    let config = match load_or_default_config(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            init_logging(DEFAULT_LOG_LEVEL);
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level);
    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    let result = match cli.command {
        Commands::Start { .. } => cmd_start(config).await,
        Commands::Keygen { output, force, .. } => cmd_keygen(&config, output, force).await,
        Commands::Pubkey { .. } => cmd_pubkey(&config).await,
        Commands::Validate { config: path } => cmd_validate(&path, &config),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Starts the node.
async fn cmd_start(config: NodeConfig) -> anyhow::Result<()> {
    let key_path = PathBuf::from(&config.identity.key_file);
    if !key_path.exists() {
        anyhow::bail!(
            "node key not found at {}; run `lightwire-node keygen` first",
            key_path.display()
        );
    }
    let identity = load_key(&key_path).await?;

    info!("════════════════════════════════════════");
    info!("Node ID:    {}", identity.node_id());
    info!("Listen:     {}", config.network.listen_addr);
    info!("Peers:      {}", config.peers.len());
    info!("════════════════════════════════════════");

    let node = Node::new(config, identity)?;
    node.run().await?;

    Ok(())
}

/// Generates and stores a fresh node key.
async fn cmd_keygen(config: &NodeConfig, output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let key_path = output.unwrap_or_else(|| PathBuf::from(&config.identity.key_file));

    if key_path.exists() && !force {
        anyhow::bail!(
            "key file {} already exists; pass --force to overwrite",
            key_path.display()
        );
    }

    let identity = StaticKeyPair::generate();
    save_key(&identity, &key_path)
        .await
        .with_context(|| format!("writing {}", key_path.display()))?;

    println!("✅ Node key written to {}", key_path.display());
    println!("   Node ID:    {}", identity.node_id());
    Ok(())
}

/// Prints the node id.
async fn cmd_pubkey(config: &NodeConfig) -> anyhow::Result<()> {
    let identity = load_key(&config.identity.key_file).await?;
    println!("{}", identity.node_id());
    Ok(())
}

/// Validates configuration file.
fn cmd_validate(config_path: &Path, config: &NodeConfig) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Node will use default values.");
        return Ok(());
    }

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:            {}", config.network.listen_addr);
    println!("   Connect Timeout:   {}s", config.network.connect_timeout_secs);
    println!();
    println!("Noise:");
    println!("   Handshake Timeout: {}s", config.noise.handshake_timeout_secs);
    println!("   Frame Timeout:     {}s", config.noise.frame_timeout_secs);
    println!("   Key Rotation:      {}", config.noise.key_rotation);
    println!("   Max Message:       {} bytes", config.noise.max_message_size);
    println!();
    println!("Limits:");
    println!("   Max Peers:         {}", config.limits.max_peers);
    println!();
    println!("Peers:");
    for peer in &config.peers {
        println!("   {}@{}", peer.node_id, peer.addr);
    }
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(log_filter(level, env.as_deref()))
        .try_init()
        .ok();
}

/// Builds the log filter: a non-empty `RUST_LOG` wins, then the configured
/// level, then `info`.
fn log_filter(level: &str, env_override: Option<&str>) -> EnvFilter {
    env_override
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Loads config, or defaults when the file does not exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<NodeConfig> {
    if path.exists() {
        NodeConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(NodeConfig::default())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn test_configured_level_sets_filter() {
        assert_eq!(log_filter("debug", None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter("warn", None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter("lightwire_node=debug", None).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_env_override_wins() {
        assert_eq!(
            log_filter("warn", Some("trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            log_filter("warn", Some("  ")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_bad_level_falls_back_to_info() {
        assert_eq!(
            log_filter("lightwire=loud", None).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[test]
    fn test_config_path_per_command() {
        let cli = Cli::parse_from(["lightwire-node", "pubkey", "--config", "/tmp/n.toml"]);
        assert_eq!(cli.command.config_path(), Path::new("/tmp/n.toml"));

        let cli = Cli::parse_from(["lightwire-node", "keygen", "--force"]);
        assert_eq!(cli.command.config_path(), Path::new("/etc/lightwire/node.toml"));
    }
}
