use crate::error::{NodeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Directory name under the user's home used when `home_dir` is not set
pub const DEFAULT_HOME_DIR_NAME: &str = "hlf-easy";

/// Subdirectory holding one directory per provisioned peer
pub const PEERS_DIR_NAME: &str = "peers";

/// Subdirectory holding one directory per certificate authority
pub const CAS_DIR_NAME: &str = "cas";

/// Default peer executable, resolved through PATH
pub const DEFAULT_PEER_BINARY: &str = "peer";

/// Parsed default configuration (built once at first access)
static DEFAULT_CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of all peer and CA state
    #[serde(default = "default_home_dir")]
    pub home_dir: PathBuf,
    #[serde(default)]
    pub peer: PeerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSettings {
    /// Executable launched as `<binary> node start`
    #[serde(default = "default_peer_binary")]
    pub binary: PathBuf,
    /// Replacement for the embedded core.yaml template
    #[serde(default)]
    pub core_template: Option<PathBuf>,
    /// When set, a peer that ignores SIGINT for this long is killed.
    /// Unset means stop waits for exit without bound.
    #[serde(default)]
    pub stop_grace_period_secs: Option<u64>,
    /// How often `peerctl run` logs process status
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
}

impl Default for PeerSettings {
    fn default() -> Self {
        Self {
            binary: default_peer_binary(),
            core_template: None,
            stop_grace_period_secs: None,
            status_interval_secs: default_status_interval_secs(),
        }
    }
}

fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(DEFAULT_HOME_DIR_NAME)
}

fn default_peer_binary() -> PathBuf {
    PathBuf::from(DEFAULT_PEER_BINARY)
}

fn default_status_interval_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NodeError::io(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("[Config] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| NodeError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration rooted at `home_dir`, everything else default
    pub fn with_home_dir(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.home_dir.as_os_str().is_empty() {
            return Err(NodeError::Config("home_dir must not be empty".to_string()));
        }
        if self.peer.binary.as_os_str().is_empty() {
            return Err(NodeError::Config("peer.binary must not be empty".to_string()));
        }
        if self.peer.status_interval_secs == 0 {
            return Err(NodeError::Config(
                "peer.status_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.peer.stop_grace_period_secs == Some(0) {
            return Err(NodeError::Config(
                "peer.stop_grace_period_secs must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn peers_dir(&self) -> PathBuf {
        self.home_dir.join(PEERS_DIR_NAME)
    }

    pub fn cas_dir(&self) -> PathBuf {
        self.home_dir.join(CAS_DIR_NAME)
    }

    pub fn stop_grace_period(&self) -> Option<Duration> {
        self.peer.stop_grace_period_secs.map(Duration::from_secs)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.peer.status_interval_secs)
    }

    fn build_default() -> Config {
        Config {
            home_dir: default_home_dir(),
            peer: PeerSettings::default(),
        }
    }

    /// Get the default configuration (cached in OnceLock)
    pub(crate) fn default_parsed() -> &'static Config {
        DEFAULT_CONFIG.get_or_init(Self::build_default)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_parsed().clone()
    }
}
