//! Peer node lifecycle
//!
//! Provisions peer identities from a local CA (TLS and signing certificates,
//! NodeOU descriptor, rendered core.yaml) and supervises the external peer
//! process: start, stop and point-in-time status.

pub mod ca;
pub mod command;
pub mod config;
pub mod error;
pub mod layout;
pub mod node;
pub mod persist;
pub mod process;
pub mod provision;
pub mod template;

pub use ca::{CaPair, CaStore, CertificateAuthority, CertificateRequest, LocalCa, SignedCertificate};
pub use command::PeerCommand;
pub use config::Config;
pub use error::{ErrorKind, NodeError, Result};
pub use layout::NodeLayout;
pub use node::{NodeHandle, PeerConfig};
pub use process::{
    CommandFactory, OsPlatform, ProcessExit, ProcessMonitor, ProcessPlatform, ProcessSample,
    ProcessState, RunState, StopPolicy, Supervisor,
};
pub use provision::{partition_hosts, EnrollRequest, NodeIdentity, Provisioner};
pub use template::ConfigMaterializer;
