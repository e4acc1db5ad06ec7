//! `peer node start` invocation for a provisioned node.
//!
//! Everything the peer needs beyond core.yaml is passed as `CORE_*`
//! environment overrides pointing into the node directory.

use crate::error::Result;
use crate::layout::NodeLayout;
use crate::process::CommandFactory;
use crate::provision::EnrollRequest;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct PeerCommand {
    binary: PathBuf,
    layout: NodeLayout,
    request: EnrollRequest,
}

impl PeerCommand {
    pub fn new(binary: impl Into<PathBuf>, layout: NodeLayout, request: EnrollRequest) -> Self {
        Self {
            binary: binary.into(),
            layout,
            request,
        }
    }

    /// Read the recorded request from the node directory
    pub fn load(binary: &Path, layout: &NodeLayout) -> Result<Self> {
        let request = EnrollRequest::load(layout)?;
        Ok(Self::new(binary, layout.clone(), request))
    }

    /// Environment passed to the peer, in a stable order
    pub fn env(&self) -> Vec<(String, String)> {
        let root = self.layout.root();
        let path = |p: PathBuf| p.to_string_lossy().into_owned();
        let request = &self.request;

        let mut env = vec![
            ("FABRIC_CFG_PATH".to_string(), path(root.to_path_buf())),
            ("CORE_PEER_ID".to_string(), request.id.clone()),
            ("CORE_PEER_LOCALMSPID".to_string(), request.msp_id.clone()),
            ("CORE_PEER_MSPCONFIGPATH".to_string(), path(root.to_path_buf())),
            (
                "CORE_PEER_FILESYSTEMPATH".to_string(),
                path(self.layout.data_dir()),
            ),
            ("CORE_PEER_TLS_ENABLED".to_string(), "true".to_string()),
            (
                "CORE_PEER_TLS_CERT_FILE".to_string(),
                path(self.layout.tls_cert_file()),
            ),
            (
                "CORE_PEER_TLS_KEY_FILE".to_string(),
                path(self.layout.tls_key_file()),
            ),
            (
                "CORE_PEER_TLS_ROOTCERT_FILE".to_string(),
                path(self.layout.tls_ca_cert_file()),
            ),
            (
                "CORE_PEER_LISTENADDRESS".to_string(),
                request.listen_address.clone(),
            ),
            (
                "CORE_PEER_CHAINCODELISTENADDRESS".to_string(),
                request.chaincode_listen_address.clone(),
            ),
            (
                "CORE_OPERATIONS_LISTENADDRESS".to_string(),
                request.operations_listen_address.clone(),
            ),
        ];
        if let Some(endpoint) = &request.external_endpoint {
            env.push(("CORE_PEER_ADDRESS".to_string(), endpoint.clone()));
            env.push((
                "CORE_PEER_GOSSIP_EXTERNALENDPOINT".to_string(),
                endpoint.clone(),
            ));
        }
        env
    }

    pub fn build(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(["node", "start"])
            .current_dir(self.layout.root())
            .envs(self.env())
            .stdin(Stdio::null());
        command
    }

    /// Factory that re-reads `init.json` on every start, so a node
    /// re-provisioned between runs starts with its current parameters.
    pub fn factory(binary: PathBuf, layout: NodeLayout) -> CommandFactory {
        Box::new(move || Ok(PeerCommand::load(&binary, &layout)?.build()))
    }
}
