//! gatelink: keep a session with a remote peer, or run one request on it.
//!
//!   gatelink --config gatelink.toml run
//!   gatelink --url ws://cc-1:1991 --peer-role controlcenter --peer-name cc-1 command uptime
//!   gatelink --config gatelink.toml stats connector

mod config;
mod link;
mod services;

use clap::{Parser, Subcommand};
use config::DaemonConfig;
use gatelink_connector::{Connector, RpcKind};
use link::{Link, OneShot};
use services::LocalHost;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gatelink", version, about = "Session connector to a remote peer")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "GATELINK_CONFIG")]
    config: Option<PathBuf>,

    /// Peer WebSocket URL, overriding `[peer] url`.
    #[arg(long, env = "GATELINK_URL")]
    url: Option<String>,

    #[arg(long)]
    peer_role: Option<String>,

    #[arg(long)]
    peer_name: Option<String>,

    #[arg(long)]
    peer_service: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Keep a session open, reconnecting on loss (default).
    Run,
    /// Run a command on the peer and print the answer.
    Command {
        line: String,
        #[arg(long)]
        service: Option<String>,
    },
    /// Collect stats from the peer and print them.
    Stats {
        name: String,
        #[arg(long)]
        service: Option<String>,
    },
}

impl Cli {
    fn load(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::load(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(url) = &self.url {
            config.peer.url = url.clone();
        }
        if let Some(role) = &self.peer_role {
            config.connector.wanted_peer_role = role.clone();
        }
        if let Some(name) = &self.peer_name {
            config.connector.wanted_peer_name = name.clone();
        }
        if let Some(service) = &self.peer_service {
            config.connector.wanted_peer_service = service.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gatelink=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.load()?;
    let node = config.node_identity();
    tracing::info!(
        role = %node.role,
        name = %node.name,
        peer = %config.peer.url,
        wanted_role = %config.connector.wanted_peer_role,
        wanted_name = %config.connector.wanted_peer_name,
        "starting"
    );

    let host = LocalHost::new(node, config.subscriptions());
    let connector = Connector::new(config.connector.clone());
    let link = Link::new(connector, host, config.peer.url.clone(), config.peer.reconnect_delay());

    let shot = match cli.command {
        None | Some(Command::Run) => {
            return tokio::select! {
                result = link.serve() => result,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down");
                    Ok(())
                }
            };
        }
        Some(Command::Command { line, service }) => OneShot::new(RpcKind::Command, line, service),
        Some(Command::Stats { name, service }) => OneShot::new(RpcKind::Stats, name, service),
    };

    let answer = link.request(shot).await?;
    println!("{}", serde_json::to_string_pretty(&answer.payload)?);
    Ok(())
}
