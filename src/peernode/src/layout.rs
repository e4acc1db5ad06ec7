//! Per-node directory schema.
//!
//! Every path is derived from the peers directory and the node id alone:
//!
//! ```text
//! <peers_dir>/<node_id>/
//!   identity.json          full node identity
//!   init.json              provisioning request, for replay
//!   config.yaml            NodeOU descriptor
//!   core.yaml              rendered runtime configuration
//!   tls.crt / tls.key      TLS certificate and key
//!   signcerts/cert.pem     signing certificate
//!   keystore/key.pem       signing key
//!   cacerts/cacert.pem     signing CA chain
//!   tlscacerts/cacert.pem  TLS CA chain
//!   data/                  peer file system path
//! ```

use crate::error::{NodeError, Result};
use std::path::{Path, PathBuf};

pub const IDENTITY_FILE: &str = "identity.json";
pub const REQUEST_FILE: &str = "init.json";
pub const NODE_OU_FILE: &str = "config.yaml";
pub const CORE_CONFIG_FILE: &str = "core.yaml";
pub const TLS_CERT_FILE: &str = "tls.crt";
pub const TLS_KEY_FILE: &str = "tls.key";
pub const SIGN_CERTS_DIR: &str = "signcerts";
pub const KEYSTORE_DIR: &str = "keystore";
pub const CA_CERTS_DIR: &str = "cacerts";
pub const TLS_CA_CERTS_DIR: &str = "tlscacerts";
pub const DATA_DIR: &str = "data";

const SIGN_CERT_NAME: &str = "cert.pem";
const SIGN_KEY_NAME: &str = "key.pem";
const CA_CERT_NAME: &str = "cacert.pem";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLayout {
    node_id: String,
    root: PathBuf,
}

impl NodeLayout {
    /// Resolve the layout of `node_id` under `peers_dir`.
    ///
    /// Ids that would escape or alias another node's root (empty, `.`, `..`,
    /// anything containing a path separator) are rejected.
    pub fn for_node(peers_dir: &Path, node_id: &str) -> Result<Self> {
        validate_node_id(node_id)?;
        Ok(Self {
            node_id: node_id.to_string(),
            root: peers_dir.join(node_id),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn identity_file(&self) -> PathBuf {
        self.root.join(IDENTITY_FILE)
    }

    pub fn request_file(&self) -> PathBuf {
        self.root.join(REQUEST_FILE)
    }

    pub fn node_ou_file(&self) -> PathBuf {
        self.root.join(NODE_OU_FILE)
    }

    pub fn core_config_file(&self) -> PathBuf {
        self.root.join(CORE_CONFIG_FILE)
    }

    pub fn tls_cert_file(&self) -> PathBuf {
        self.root.join(TLS_CERT_FILE)
    }

    pub fn tls_key_file(&self) -> PathBuf {
        self.root.join(TLS_KEY_FILE)
    }

    pub fn sign_certs_dir(&self) -> PathBuf {
        self.root.join(SIGN_CERTS_DIR)
    }

    pub fn sign_cert_file(&self) -> PathBuf {
        self.sign_certs_dir().join(SIGN_CERT_NAME)
    }

    pub fn keystore_dir(&self) -> PathBuf {
        self.root.join(KEYSTORE_DIR)
    }

    pub fn sign_key_file(&self) -> PathBuf {
        self.keystore_dir().join(SIGN_KEY_NAME)
    }

    pub fn ca_certs_dir(&self) -> PathBuf {
        self.root.join(CA_CERTS_DIR)
    }

    pub fn ca_cert_file(&self) -> PathBuf {
        self.ca_certs_dir().join(CA_CERT_NAME)
    }

    pub fn tls_ca_certs_dir(&self) -> PathBuf {
        self.root.join(TLS_CA_CERTS_DIR)
    }

    pub fn tls_ca_cert_file(&self) -> PathBuf {
        self.tls_ca_certs_dir().join(CA_CERT_NAME)
    }

    /// The peer's `fileSystemPath` (ledger, snapshots)
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }
}

/// Reject identifiers that are not a single, normal path component.
pub fn validate_node_id(node_id: &str) -> Result<()> {
    let invalid = node_id.is_empty()
        || node_id == "."
        || node_id == ".."
        || node_id.contains('/')
        || node_id.contains('\\')
        || node_id.contains('\0');
    if invalid {
        return Err(NodeError::InvalidNodeId(node_id.to_string()));
    }
    Ok(())
}
