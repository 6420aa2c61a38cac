use anyhow::Context;
use clap::Parser;
use ledger_core::Node;
use ledger_node::{
    api::{self, AppState},
    config::Args,
    p2p::{self, PeerHub},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let node = Arc::new(Node::new(PeerHub::new()).with_parallel_pow(args.parallel_pow));

    let p2p_listener = TcpListener::bind(args.p2p_listen)
        .await
        .with_context(|| format!("binding p2p listener on {}", args.p2p_listen))?;
    tokio::spawn({
        let node = node.clone();
        async move {
            if let Err(err) = p2p::serve(p2p_listener, node).await {
                error!(error = %err, "p2p listener stopped");
            }
        }
    });

    for addr in &args.peers {
        match p2p::connect(addr, node.clone()).await {
            Ok(peer) => info!(peer = %peer, "connected to peer"),
            Err(err) => warn!(addr = %addr, error = %err, "could not connect to peer"),
        }
    }

    let app = api::router(AppState { node });
    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding http listener on {}", args.listen))?;
    info!("ledger-node listening on http://{}", args.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
