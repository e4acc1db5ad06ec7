//! Named CAs on disk.
//!
//! Each CA name owns a signing CA and a TLS CA:
//! `<cas_dir>/<name>/{ca,tlsca}/{cert.pem,key.pem}`.

use super::{CertificateAuthority, LocalCa};
use crate::error::{NodeError, Result};
use crate::layout::validate_node_id;
use crate::persist::{create_dir, write_file, write_private};
use std::path::{Path, PathBuf};

const SIGN_CA_DIR: &str = "ca";
const TLS_CA_DIR: &str = "tlsca";
const CERT_FILENAME: &str = "cert.pem";
const KEY_FILENAME: &str = "key.pem";

/// Signing CA plus TLS CA for one organization
pub struct CaPair {
    pub sign: LocalCa,
    pub tls: LocalCa,
}

pub struct CaStore {
    root: PathBuf,
}

impl CaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ca_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        let dir = self.ca_dir(name);
        [SIGN_CA_DIR, TLS_CA_DIR]
            .iter()
            .all(|sub| dir.join(sub).join(KEY_FILENAME).exists())
    }

    /// Generate both CAs for `name` and write them to disk.
    ///
    /// Refuses a name that already has a CA: replacing it would orphan every
    /// node issued from it. Use [`CaStore::replace`] to do that on purpose.
    pub fn create(&self, name: &str) -> Result<CaPair> {
        validate_node_id(name)?;
        if self.exists(name) {
            return Err(NodeError::CaExists(name.to_string()));
        }
        self.generate(name)
    }

    /// Generate both CAs for `name`, overwriting an existing pair
    pub fn replace(&self, name: &str) -> Result<CaPair> {
        validate_node_id(name)?;
        if self.exists(name) {
            tracing::warn!("[CaStore] Replacing existing CA {}", name);
        }
        self.generate(name)
    }

    fn generate(&self, name: &str) -> Result<CaPair> {
        tracing::info!("[CaStore] Generating signing CA for {}", name);
        let sign = LocalCa::generate(&format!("ca.{}", name), name)?;
        tracing::info!("[CaStore] Generating TLS CA for {}", name);
        let tls = LocalCa::generate(&format!("tlsca.{}", name), name)?;

        let dir = self.ca_dir(name);
        write_ca(&dir.join(SIGN_CA_DIR), &sign)?;
        write_ca(&dir.join(TLS_CA_DIR), &tls)?;

        tracing::info!("[CaStore] CA {} stored at {}", name, dir.display());
        Ok(CaPair { sign, tls })
    }

    pub fn load(&self, name: &str) -> Result<CaPair> {
        validate_node_id(name)?;
        if !self.exists(name) {
            return Err(NodeError::CaNotFound(name.to_string()));
        }

        let dir = self.ca_dir(name);
        let sign = read_ca(&dir.join(SIGN_CA_DIR))?;
        let tls = read_ca(&dir.join(TLS_CA_DIR))?;
        tracing::debug!("[CaStore] Loaded CA {}", name);
        Ok(CaPair { sign, tls })
    }
}

fn write_ca(dir: &Path, ca: &LocalCa) -> Result<()> {
    create_dir(dir)?;
    write_private(&dir.join(KEY_FILENAME), ca.key_pem().as_bytes())?;
    write_file(&dir.join(CERT_FILENAME), ca.certificate_pem().as_bytes())
}

fn read_ca(dir: &Path) -> Result<LocalCa> {
    let cert_path = dir.join(CERT_FILENAME);
    let key_path = dir.join(KEY_FILENAME);
    let cert_pem =
        std::fs::read_to_string(&cert_path).map_err(|e| NodeError::io(&cert_path, e))?;
    let key_pem = std::fs::read_to_string(&key_path).map_err(|e| NodeError::io(&key_path, e))?;
    LocalCa::from_pem(&cert_pem, &key_pem)
}
