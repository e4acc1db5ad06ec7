//! Node identity provisioning.
//!
//! Requests a TLS certificate and a signing (enrollment) certificate from the
//! CA, then writes the identity material, NodeOU descriptor, rendered
//! core.yaml and the original request into the node directory.
//!
//! Each file is replaced atomically, but a run is not transactional across
//! files. A failed run may leave a mix of old and new artifacts; re-running
//! overwrites every artifact.

use crate::ca::{CaStore, CertificateAuthority, CertificateRequest, SignedCertificate};
use crate::error::{NodeError, Result};
use crate::layout::{NodeLayout, CA_CERTS_DIR};
use crate::persist::{create_dir, write_file, write_private};
use crate::template::ConfigMaterializer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Organizational unit carried by peer certificates
pub const PEER_OU: &str = "peer";

/// Parameters of a provisioning call, persisted as `init.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollRequest {
    pub id: String,
    pub msp_id: String,
    pub ca_name: String,
    /// Hostnames and IP literals for the TLS certificate's SANs
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Issue from a local CA. Externally issued material is not supported.
    #[serde(default = "default_local")]
    pub local: bool,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_chaincode_listen_address")]
    pub chaincode_listen_address: String,
    #[serde(default = "default_operations_listen_address")]
    pub operations_listen_address: String,
    #[serde(default)]
    pub external_endpoint: Option<String>,
}

fn default_local() -> bool {
    true
}

fn default_listen_address() -> String {
    "0.0.0.0:7051".to_string()
}

fn default_chaincode_listen_address() -> String {
    "0.0.0.0:7052".to_string()
}

fn default_operations_listen_address() -> String {
    "127.0.0.1:9443".to_string()
}

impl EnrollRequest {
    pub fn new(id: impl Into<String>, msp_id: impl Into<String>, ca_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            msp_id: msp_id.into(),
            ca_name: ca_name.into(),
            hosts: Vec::new(),
            local: default_local(),
            listen_address: default_listen_address(),
            chaincode_listen_address: default_chaincode_listen_address(),
            operations_listen_address: default_operations_listen_address(),
            external_endpoint: None,
        }
    }

    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Load the request recorded in a node directory
    pub fn load(layout: &NodeLayout) -> Result<Self> {
        let path = layout.request_file();
        if !path.exists() {
            return Err(NodeError::NotProvisioned {
                node_id: layout.node_id().to_string(),
                path,
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| NodeError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| NodeError::Serialization {
            path,
            reason: e.to_string(),
        })
    }
}

/// Full identity of a provisioned node, persisted as `identity.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: String,
    pub organization_id: String,
    pub tls_certificate: String,
    pub tls_private_key: String,
    pub signing_certificate: String,
    pub signing_private_key: String,
    pub ca_certificate_chain: String,
    pub tls_ca_certificate_chain: String,
    pub provisioned_at: DateTime<Utc>,
}

/// Split SAN entries into IP literals and DNS names
pub fn partition_hosts(hosts: &[String]) -> (Vec<IpAddr>, Vec<String>) {
    let mut ips = Vec::new();
    let mut dns_names = Vec::new();
    for host in hosts {
        match host.parse::<IpAddr>() {
            Ok(ip) => ips.push(ip),
            Err(_) => dns_names.push(host.clone()),
        }
    }
    (ips, dns_names)
}

#[derive(Serialize)]
struct NodeOuDescriptor {
    #[serde(rename = "NodeOUs")]
    node_ous: NodeOus,
}

#[derive(Serialize)]
struct NodeOus {
    #[serde(rename = "Enable")]
    enable: bool,
    #[serde(rename = "ClientOUIdentifier")]
    client: OuIdentifier,
    #[serde(rename = "PeerOUIdentifier")]
    peer: OuIdentifier,
    #[serde(rename = "AdminOUIdentifier")]
    admin: OuIdentifier,
    #[serde(rename = "OrdererOUIdentifier")]
    orderer: OuIdentifier,
}

#[derive(Serialize)]
struct OuIdentifier {
    #[serde(rename = "Certificate")]
    certificate: String,
    #[serde(rename = "OrganizationalUnitIdentifier")]
    organizational_unit_identifier: String,
}

impl OuIdentifier {
    fn new(ou: &str) -> Self {
        Self {
            certificate: format!("{}/cacert.pem", CA_CERTS_DIR),
            organizational_unit_identifier: ou.to_string(),
        }
    }
}

/// The `config.yaml` mapping certificate OUs to node roles
pub fn node_ou_descriptor() -> Result<String> {
    let descriptor = NodeOuDescriptor {
        node_ous: NodeOus {
            enable: true,
            client: OuIdentifier::new("client"),
            peer: OuIdentifier::new(PEER_OU),
            admin: OuIdentifier::new("admin"),
            orderer: OuIdentifier::new("orderer"),
        },
    };
    serde_yaml::to_string(&descriptor).map_err(|e| NodeError::Serialization {
        path: PathBuf::from(crate::layout::NODE_OU_FILE),
        reason: e.to_string(),
    })
}

pub struct Provisioner<'a> {
    peers_dir: PathBuf,
    materializer: &'a ConfigMaterializer,
}

impl<'a> Provisioner<'a> {
    pub fn new(peers_dir: impl Into<PathBuf>, materializer: &'a ConfigMaterializer) -> Self {
        Self {
            peers_dir: peers_dir.into(),
            materializer,
        }
    }

    /// Provision a node from the CA named in the request
    pub fn enroll(&self, cas: &CaStore, request: &EnrollRequest) -> Result<NodeLayout> {
        ensure_local(request)?;
        let ca = cas.load(&request.ca_name)?;
        self.provision(request, &ca.sign, &ca.tls)
    }

    /// Provision a node from explicit signing and TLS authorities
    pub fn provision(
        &self,
        request: &EnrollRequest,
        sign_ca: &dyn CertificateAuthority,
        tls_ca: &dyn CertificateAuthority,
    ) -> Result<NodeLayout> {
        ensure_local(request)?;
        let layout = NodeLayout::for_node(&self.peers_dir, &request.id)?;

        tracing::info!(
            node_id = %request.id,
            msp_id = %request.msp_id,
            ca = %request.ca_name,
            "[Provisioner] Provisioning node identity"
        );

        create_dir(layout.root())?;

        let (ip_addresses, dns_names) = partition_hosts(&request.hosts);
        let tls = tls_ca.sign(&CertificateRequest {
            common_name: request.id.clone(),
            organizational_unit: Some(PEER_OU.to_string()),
            dns_names,
            ip_addresses,
        })?;
        let sign = sign_ca.sign(&CertificateRequest {
            common_name: request.id.clone(),
            organizational_unit: Some(PEER_OU.to_string()),
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
        })?;

        let identity = NodeIdentity {
            node_id: request.id.clone(),
            organization_id: request.msp_id.clone(),
            tls_certificate: tls.certificate_pem.clone(),
            tls_private_key: tls.private_key_pem.clone(),
            signing_certificate: sign.certificate_pem.clone(),
            signing_private_key: sign.private_key_pem.clone(),
            ca_certificate_chain: sign_ca.certificate_pem().to_string(),
            tls_ca_certificate_chain: tls_ca.certificate_pem().to_string(),
            provisioned_at: Utc::now(),
        };

        self.write_identity(&layout, &identity, &tls, &sign)?;
        self.materializer.materialize(&layout)?;
        write_json(&layout.request_file(), request)?;

        tracing::info!(
            node_id = %request.id,
            path = %layout.root().display(),
            "[Provisioner] Node identity provisioned"
        );
        Ok(layout)
    }

    fn write_identity(
        &self,
        layout: &NodeLayout,
        identity: &NodeIdentity,
        tls: &SignedCertificate,
        sign: &SignedCertificate,
    ) -> Result<()> {
        // identity.json carries both private keys
        let identity_path = layout.identity_file();
        write_private(&identity_path, to_json(&identity_path, identity)?.as_bytes())?;

        create_dir(&layout.keystore_dir())?;
        write_private(&layout.sign_key_file(), sign.private_key_pem.as_bytes())?;

        create_dir(&layout.tls_ca_certs_dir())?;
        write_file(
            &layout.tls_ca_cert_file(),
            identity.tls_ca_certificate_chain.as_bytes(),
        )?;

        create_dir(&layout.ca_certs_dir())?;
        write_file(
            &layout.ca_cert_file(),
            identity.ca_certificate_chain.as_bytes(),
        )?;

        create_dir(&layout.sign_certs_dir())?;
        write_file(&layout.sign_cert_file(), sign.certificate_pem.as_bytes())?;

        write_file(&layout.node_ou_file(), node_ou_descriptor()?.as_bytes())?;

        write_private(&layout.tls_key_file(), tls.private_key_pem.as_bytes())?;
        write_file(&layout.tls_cert_file(), tls.certificate_pem.as_bytes())?;
        Ok(())
    }
}

fn ensure_local(request: &EnrollRequest) -> Result<()> {
    if !request.local {
        return Err(NodeError::UnsupportedMode {
            node_id: request.id.clone(),
        });
    }
    Ok(())
}

fn to_json<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| NodeError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_file(path, to_json(path, value)?.as_bytes())
}
