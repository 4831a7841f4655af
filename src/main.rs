//! Gossip-Ledger node
//!
//! Binds a UDP port, joins the mesh through the seed and reads operator
//! commands from standard input.

use clap::Parser;
use gossip_ledger::cli::Command;
use gossip_ledger::network::{Node, NodeConfig, NodeHandle, PeerInfo};
use gossip_ledger::wallet::KeyStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "gossip-ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A minimal peer-to-peer ledger over UDP gossip", long_about = None)]
struct Cli {
    /// Port to listen on (an ephemeral port if omitted)
    port: Option<u16>,

    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Seed node used to join the network
    #[arg(short, long, default_value = "127.0.0.1:8888", value_parser = parse_peer)]
    seed: PeerInfo,

    /// Mining difficulty (leading zero hex digits)
    #[arg(short, long, default_value_t = gossip_ledger::core::DEFAULT_DIFFICULTY)]
    difficulty: usize,

    /// Wallet file holding the node's key pair
    #[arg(short, long, default_value = "wallet.json")]
    wallet: PathBuf,
}

fn parse_peer(value: &str) -> Result<PeerInfo, String> {
    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected HOST:PORT, got '{}'", value))?;
    let port = port
        .parse()
        .map_err(|e| format!("invalid port '{}': {}", port, e))?;
    Ok(PeerInfo::new(host, port))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = NodeConfig {
        host: cli.host,
        port: cli.port.unwrap_or(0),
        seed: cli.seed,
        difficulty: cli.difficulty,
        wallet_path: cli.wallet,
    };

    let keys = KeyStore::new(&config.wallet_path).load_or_create()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let node = Node::bind(config, Arc::new(keys)).await?;
        let handle = node.handle();

        println!("Listening on port {}", node.local_addr().port());
        println!("Address: {}", node.state().address());

        tokio::spawn(read_commands(handle.clone()));

        // Handle Ctrl+C
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            println!("\nShutting down node...");
            handle.shutdown().await;
        });

        node.run().await?;
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    })?;

    // Stdin reads block a runtime thread; don't wait for them on exit.
    rt.shutdown_background();
    Ok(())
}

/// Forward each non-blank line of standard input to the node
async fn read_commands(handle: NodeHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if !handle.command(Command::parse(&line)).await {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read standard input: {}", e);
                break;
            }
        }
    }
}
