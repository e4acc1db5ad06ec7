use crate::command::PeerCommand;
use crate::config::Config;
use crate::error::{NodeError, Result};
use crate::layout::NodeLayout;
use crate::process::{OsPlatform, ProcessPlatform, ProcessState, StopPolicy, Supervisor};
use crate::provision::EnrollRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Certificates of a provisioned node, as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    #[serde(rename = "tlsCert")]
    pub tls_cert: String,
    #[serde(rename = "signCert")]
    pub sign_cert: String,
    #[serde(rename = "tlsCACert")]
    pub tls_ca_cert: String,
    #[serde(rename = "signCACert")]
    pub sign_ca_cert: String,
}

/// A peer node: identity on disk plus its process supervisor
pub struct NodeHandle<P: ProcessPlatform = OsPlatform> {
    organization_id: String,
    layout: NodeLayout,
    supervisor: Supervisor<P>,
}

impl NodeHandle<OsPlatform> {
    /// Handle for a node provisioned under `config.home_dir`.
    ///
    /// The organization id comes from the recorded `init.json`; the command
    /// line is rebuilt from it on every start.
    pub fn open(config: &Config, node_id: &str) -> Result<Self> {
        let layout = NodeLayout::for_node(&config.peers_dir(), node_id)?;
        let request = EnrollRequest::load(&layout)?;

        let factory = PeerCommand::factory(config.peer.binary.clone(), layout.clone());
        let supervisor = Supervisor::new(node_id, factory)
            .with_stop_policy(StopPolicy::from_grace_period(config.stop_grace_period()));

        Ok(Self::new(layout, request.msp_id, supervisor))
    }
}

impl<P: ProcessPlatform> NodeHandle<P> {
    pub fn new(
        layout: NodeLayout,
        organization_id: impl Into<String>,
        supervisor: Supervisor<P>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            layout,
            supervisor,
        }
    }

    pub fn get_id(&self) -> &str {
        self.layout.node_id()
    }

    pub fn get_organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Read back the node's certificates. Any missing file means the node has
    /// not been (fully) provisioned; partial data is never returned.
    pub fn get_config(&self) -> Result<PeerConfig> {
        Ok(PeerConfig {
            tls_cert: self.read_artifact(&self.layout.tls_cert_file())?,
            sign_cert: self.read_artifact(&self.layout.sign_cert_file())?,
            sign_ca_cert: self.read_artifact(&self.layout.ca_cert_file())?,
            tls_ca_cert: self.read_artifact(&self.layout.tls_ca_cert_file())?,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.supervisor.start()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.supervisor.stop()
    }

    pub fn status(&self) -> Result<ProcessState> {
        self.supervisor.status()
    }

    pub fn supervisor(&self) -> &Supervisor<P> {
        &self.supervisor
    }

    fn read_artifact(&self, path: &Path) -> Result<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(NodeError::NotProvisioned {
                node_id: self.layout.node_id().to_string(),
                path: path.to_path_buf(),
            }),
            Err(e) => Err(NodeError::io(path, e)),
        }
    }
}
