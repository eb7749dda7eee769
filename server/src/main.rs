//! Exchange server binary: accepts TCP connections, frames requests per
//! the length-prefixed wire protocol, and dispatches them against a
//! shared `Engine`. The TCP acceptor and byte framing here are the
//! "external collaborator" plumbing spec.md §1 scopes out of the core;
//! this binary exists only to give the core something to run inside.

use clap::Parser;
use engine::Engine;
use server::config::ServerConfig;
use std::sync::Arc;
use store::Store;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exchange-server")]
#[command(about = "Network-accessible stock exchange engine")]
struct Args {
    /// Overrides EXCHANGE_BIND.
    #[arg(short, long)]
    bind: Option<String>,
    /// Overrides EXCHANGE_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind.parse()?;
    }
    if let Some(log) = args.log {
        config.log_filter = log;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = Arc::new(Store::new());
    let engine = Arc::new(Engine::new(store));
    engine.rebuild().await;

    let listener = TcpListener::bind(config.bind_addr).await?;
    server::serve(listener, engine).await;
}
