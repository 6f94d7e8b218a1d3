//! Triangular strike bot
//!
//! Main entry point: subscribe to swap logs and strike on each relevant one

use std::env;
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context};
use tokio::signal;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use triarb_bot::Dispatcher;
use triarb_core::{symbol_of, StrikeConfig};
use triarb_executor::{Collaborators, DecisionEngine, NonceManager, RpcNode, StaticSizer};
use triarb_log_feed::LogFeed;

const DEFAULT_CONFIG_PATH: &str = "triarb.toml";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if env::var("TRIARB_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing();
    info!("Starting triarb v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = env::var("TRIARB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = StrikeConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    let signer: PrivateKeySigner = env::var("TREASURY_PRIVATE_KEY")
        .context("TREASURY_PRIVATE_KEY is not set")?
        .parse()
        .context("TREASURY_PRIVATE_KEY is not a valid private key")?;

    // Node access and nonce counter
    let node = Arc::new(RpcNode::connect(&config.execution.rpc_url, signer).await?);
    let chain_id = node.chain_id().await?;
    if chain_id != config.chain.chain_id() {
        bail!(
            "node reports chain {} but configuration targets {} ({})",
            chain_id,
            config.chain.chain_id(),
            config.chain
        );
    }
    let nonces = Arc::new(NonceManager::synced(node.account(), node.clone()).await?);

    let engine = Arc::new(DecisionEngine::new(
        &config,
        Collaborators {
            sizer: Arc::new(StaticSizer::from_config(&config.sizing)),
            caller: node.clone(),
            sink: node.clone(),
            nonces,
        },
    )?);

    let triangle = &config.triangle;
    info!(
        chain = %config.chain,
        target = %config.target_contract,
        base = symbol_of(config.chain, triangle.base).unwrap_or("?"),
        first = symbol_of(config.chain, triangle.first).unwrap_or("?"),
        second = symbol_of(config.chain, triangle.second).unwrap_or("?"),
        whale_gate = config.feed.whale_gate,
        "Engine armed"
    );

    // Event source
    let (events_tx, events_rx) = mpsc::channel(config.feed.channel_capacity);
    let feed = LogFeed::new(config.feed.clone());
    let feed_stats = feed.stats();
    let feed_task = tokio::spawn(async move { feed.run(events_tx).await });

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Listening for swaps, press Ctrl+C to shutdown");

    let summary = Dispatcher::new(Arc::clone(&engine), config.execution.max_in_flight_cycles)
        .run(events_rx, shutdown_rx)
        .await;
    feed_task.abort();

    info!(
        received = summary.received,
        submitted = summary.submitted,
        discarded = summary.discarded,
        failed = summary.failed,
        feed_received = feed_stats.received(),
        feed_reconnects = feed_stats.reconnects(),
        stats = ?engine.stats(),
        "Shutdown complete"
    );
    Ok(())
}
