//! Main entry point for the pool-sentinel watcher
//!
//! Wires the discovery pipeline, the multiplier scanner and the health
//! endpoint around one shared token ledger and runs until Ctrl-C.

use anyhow::{Context, Result};
use pool_sentinel::config::WatcherConfig;
use pool_sentinel::health;
use pool_sentinel::storage::{SqliteTokenLedger, TokenLedger};
use pool_sentinel::watcher::{
    notifier_from_config, AdmissionEvaluator, ChainDataSource, DiscoveryPipeline,
    JupiterQuoteProvider, LogsSubscription, MintResolver, MultiplierScanner, QuoteProvider,
    RpcChainData,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WatcherConfig::from_env().context("Invalid configuration")?;
    info!(
        "Starting pool-sentinel: rpc={} programs={} min_mc=${} max_top10={}% quote={}",
        config.resolved_rpc(),
        config.programs.len(),
        config.thresholds.min_market_cap_usd,
        config.thresholds.max_top10_holder_percent,
        config.quote_token
    );

    let sqlite = SqliteTokenLedger::open(&config.database_path).await?;
    let ledger: Arc<dyn TokenLedger> = sqlite.clone();

    let http_client = reqwest::Client::new();
    let chain: Arc<dyn ChainDataSource> = Arc::new(RpcChainData::from_config(&config));
    let quotes: Arc<dyn QuoteProvider> = Arc::new(JupiterQuoteProvider::from_config(http_client.clone(), &config));
    let notifier = notifier_from_config(http_client, &config);

    let pipeline = DiscoveryPipeline::new(
        MintResolver::new(chain.clone()),
        AdmissionEvaluator::new(chain.clone(), quotes.clone(), config.thresholds),
        ledger.clone(),
        notifier.clone(),
    );
    let scanner = MultiplierScanner::new(
        ledger.clone(),
        chain,
        quotes,
        notifier,
        config.scan_interval(),
        config.scan_batch_size,
    );

    let (subscription, events) = LogsSubscription::spawn(
        config.resolved_ws(),
        config.program_ids(),
        config.logs_commitment.clone(),
        config.event_channel_capacity,
    );

    let discovery_handle = tokio::spawn(async move {
        pipeline.run(events).await;
    });

    let scanner_handle = tokio::spawn(scanner.run());

    let listen = config.http_listen.clone();
    let health_ledger = ledger.clone();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health::serve(&listen, health_ledger).await {
            error!("Health endpoint failed: {:#}", e);
        }
    });

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    // Closing the subscription lets the discovery loop drain and exit on its own
    subscription.cancel();
    scanner_handle.abort();
    health_handle.abort();
    if let Err(e) = discovery_handle.await {
        error!("Discovery task ended abnormally: {}", e);
    }

    sqlite.close().await;
    info!("pool-sentinel stopped");
    Ok(())
}
