use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

/// Broad failure classes, so callers can decide on retry without matching
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Start while running, stop while stopped, creating a CA that exists.
    StateConflict,
    /// Provisioning mode that is not CA-backed. Permanent.
    UnsupportedMode,
    /// CA signing or OS process query/signal failure.
    Collaborator,
    /// Filesystem read/write failure, or missing artifacts.
    Persistence,
    /// Runtime configuration template could not be parsed or rendered.
    Template,
    /// Invalid configuration or node identifier.
    Config,
}

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Node {node_id} is already running (pid {pid})")]
    AlreadyRunning { node_id: String, pid: u32 },

    #[error("Node {node_id} is not running")]
    NotRunning { node_id: String },

    #[error("Node {node_id}: only local CA-backed provisioning is supported")]
    UnsupportedMode { node_id: String },

    #[error("CA error: {0}")]
    Ca(String),

    #[error("CA not found: {0}")]
    CaNotFound(String),

    #[error("CA already exists: {0}")]
    CaExists(String),

    #[error("Command error for node {node_id}: {reason}")]
    Command { node_id: String, reason: String },

    #[error("Failed to launch node {node_id}: {source}")]
    Launch {
        node_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("Failed to wait for process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to query process {pid}: {reason}")]
    ProcessQuery { pid: u32, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Node {node_id} is not provisioned: missing {path}")]
    NotProvisioned { node_id: String, path: PathBuf },

    #[error("Serialization error on {path}: {reason}")]
    Serialization { path: PathBuf, reason: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid node id {0:?}")]
    InvalidNodeId(String),
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NodeError::AlreadyRunning { .. }
            | NodeError::NotRunning { .. }
            | NodeError::CaExists(_) => ErrorKind::StateConflict,
            NodeError::UnsupportedMode { .. } => ErrorKind::UnsupportedMode,
            NodeError::Ca(_)
            | NodeError::CaNotFound(_)
            | NodeError::Command { .. }
            | NodeError::Launch { .. }
            | NodeError::Signal { .. }
            | NodeError::Wait { .. }
            | NodeError::ProcessQuery { .. } => ErrorKind::Collaborator,
            NodeError::Io { .. }
            | NodeError::NotProvisioned { .. }
            | NodeError::Serialization { .. } => ErrorKind::Persistence,
            NodeError::Template(_) => ErrorKind::Template,
            NodeError::Config(_) | NodeError::InvalidNodeId(_) => ErrorKind::Config,
        }
    }

    /// Attach the offending path to an IO error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NodeError::Io {
            path: path.into(),
            source,
        }
    }
}
