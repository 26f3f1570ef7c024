// ============================================
// File: crates/lightwire-node/src/identity.rs
// ============================================
//! # Node Key File
//!
//! ## Creation Reason
//! The node's static secp256k1 key lives in a small JSON file next to
//! the configuration; this module reads and writes it.
//!
//! ## Main Functionality
//! - `KeyFile`: on-disk format (hex-encoded keys)
//! - `load_key` / `save_key`
//!
//! ## ⚠️ Important Note for Next Developer
//! - The file holds the private key in hex; it is written with mode 0600
//! - `load_key` checks that the stored public key matches the private key
//!
//! ## Last Modified
//! v0.1.0 - Initial key file support

use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use lightwire_common::time::unix_timestamp;
use lightwire_core::StaticKeyPair;

use crate::error::{NodeError, Result};

/// Current key file format version.
pub const KEY_FILE_VERSION: &str = "1.0";

/// Key type recorded in the file.
pub const KEY_TYPE: &str = "secp256k1";

/// Key file format.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    /// Format version.
    pub version: String,
    /// Always `secp256k1`.
    pub key_type: String,
    /// Compressed public key, hex.
    pub public_key: String,
    /// Secret scalar, hex.
    pub private_key: String,
    /// Unix seconds at creation.
    pub created_at: String,
}

impl KeyFile {
    /// Builds the file contents for `identity`.
    #[must_use]
    pub fn from_identity(identity: &StaticKeyPair) -> Self {
        Self {
            version: KEY_FILE_VERSION.to_string(),
            key_type: KEY_TYPE.to_string(),
            public_key: identity.node_id().to_string(),
            private_key: hex::encode(identity.secret_bytes().as_slice()),
            created_at: format!("{}Z", unix_timestamp()),
        }
    }

    /// Reconstructs the key pair.
    ///
    /// # Errors
    /// Returns `KeyFile` if the type is wrong, the hex is malformed or the
    /// stored public key does not belong to the private key.
    pub fn to_identity(&self, path: &str) -> Result<StaticKeyPair> {
        if self.key_type != KEY_TYPE {
            return Err(NodeError::key_file(
                path,
                format!("unsupported key type '{}'", self.key_type),
            ));
        }

        let secret = Zeroizing::new(
            hex::decode(&self.private_key)
                .map_err(|e| NodeError::key_file(path, format!("private_key: {e}")))?,
        );
        let identity = StaticKeyPair::from_secret_bytes(&secret)
            .map_err(|e| NodeError::key_file(path, e.to_string()))?;

        if identity.node_id().to_string() != self.public_key.to_ascii_lowercase() {
            return Err(NodeError::key_file(path, "public_key does not match private_key"));
        }

        Ok(identity)
    }
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Loads the node key from a JSON key file.
///
/// # Errors
/// Returns `KeyFile` if the file is missing, unparseable or inconsistent.
pub async fn load_key(path: impl AsRef<Path>) -> Result<StaticKeyPair> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let content = Zeroizing::new(
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NodeError::key_file(&path_str, e.to_string()))?,
    );
    let key_file: KeyFile = serde_json::from_str(&content)
        .map_err(|e| NodeError::key_file(&path_str, e.to_string()))?;

    key_file.to_identity(&path_str)
}

/// Writes the node key to a JSON key file, creating parent directories.
///
/// # Errors
/// Returns `KeyFile` on any filesystem failure.
pub async fn save_key(identity: &StaticKeyPair, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let fail = |e: std::io::Error| NodeError::key_file(&path_str, e.to_string());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(fail)?;
        }
    }

    let content = Zeroizing::new(
        serde_json::to_string_pretty(&KeyFile::from_identity(identity))
            .map_err(|e| NodeError::key_file(&path_str, e.to_string()))?,
    );
    tokio::fs::write(path, content.as_bytes()).await.map_err(fail)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = tokio::fs::metadata(path).await.map_err(fail)?.permissions();
        perms.set_mode(0o600);
        tokio::fs::set_permissions(path, perms).await.map_err(fail)?;
    }

    Ok(())
}
