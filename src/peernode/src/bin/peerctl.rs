//! peerctl: provision peer identities and run peer nodes.

use anyhow::Context;
use clap::{Parser, Subcommand};
use peernode::{
    CaStore, Config, ConfigMaterializer, EnrollRequest, NodeHandle, Provisioner, RunState,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "peerctl", version, about = "Provision and supervise peer nodes")]
struct Args {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Override the home directory holding peers and CAs
    #[arg(long = "home", global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Certificate authority management
    Ca {
        #[command(subcommand)]
        command: CaCmd,
    },
    /// Provision a peer identity from a local CA
    Enroll {
        #[arg(long)]
        id: String,
        #[arg(long = "msp-id")]
        msp_id: String,
        #[arg(long = "ca")]
        ca_name: String,
        /// Hostname or IP for the TLS certificate (repeatable)
        #[arg(long = "host")]
        hosts: Vec<String>,
        /// Request externally issued material (not supported)
        #[arg(long)]
        external: bool,
        #[arg(long = "listen-address", default_value = "0.0.0.0:7051")]
        listen_address: String,
        #[arg(long = "chaincode-address", default_value = "0.0.0.0:7052")]
        chaincode_listen_address: String,
        #[arg(long = "operations-address", default_value = "127.0.0.1:9443")]
        operations_listen_address: String,
        #[arg(long = "external-endpoint")]
        external_endpoint: Option<String>,
    },
    /// Print a provisioned peer's certificates as JSON
    Show { id: String },
    /// Start a peer, log its status, stop it on Ctrl+C
    Run { id: String },
}

#[derive(Subcommand, Debug)]
enum CaCmd {
    /// Create a signing CA and a TLS CA under the given name
    Create {
        name: String,
        /// Replace an existing CA of the same name
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Default to info level if RUST_LOG not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(home) = args.home {
        config.home_dir = home;
    }

    match args.command {
        Cmd::Ca {
            command: CaCmd::Create { name, force },
        } => {
            let store = CaStore::new(config.cas_dir());
            if force {
                store.replace(&name)?;
            } else {
                store.create(&name)?;
            }
            info!("CA {} created in {}", name, store.root().display());
        }
        Cmd::Enroll {
            id,
            msp_id,
            ca_name,
            hosts,
            external,
            listen_address,
            chaincode_listen_address,
            operations_listen_address,
            external_endpoint,
        } => {
            let request = EnrollRequest {
                id,
                msp_id,
                ca_name,
                hosts,
                local: !external,
                listen_address,
                chaincode_listen_address,
                operations_listen_address,
                external_endpoint,
            };
            let materializer = ConfigMaterializer::from_config(&config)?;
            let provisioner = Provisioner::new(config.peers_dir(), &materializer);
            let layout = provisioner.enroll(&CaStore::new(config.cas_dir()), &request)?;
            info!("Peer {} provisioned in {}", request.id, layout.root().display());
        }
        Cmd::Show { id } => {
            let node = NodeHandle::open(&config, &id)?;
            let peer_config = node.get_config()?;
            println!("{}", serde_json::to_string_pretty(&peer_config)?);
        }
        Cmd::Run { id } => run(&config, &id)?,
    }

    Ok(())
}

fn run(config: &Config, id: &str) -> anyhow::Result<()> {
    let mut node = NodeHandle::open(config, id)?;
    node.start()?;
    info!(
        "Peer {} ({}) started; press Ctrl+C to stop",
        node.get_id(),
        node.get_organization_id()
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let interval = config.status_interval();
    rt.block_on(async {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received");
                    break;
                }
                _ = ticker.tick() => {
                    match node.status() {
                        Ok(state) => {
                            info!(
                                pid = state.pid,
                                state = ?state.run_state,
                                rss = state.resident_memory_bytes,
                                vms = state.virtual_memory_bytes,
                                cpu = state.cpu_percent,
                                "Peer status"
                            );
                            if state.run_state == RunState::Zombie {
                                tracing::warn!("Peer {} exited on its own", node.get_id());
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Failed to query peer status: {}", e);
                            break;
                        }
                    }
                }
            }
        }
    });

    node.stop()?;
    info!("Peer {} stopped", id);
    Ok(())
}
