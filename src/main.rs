use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tron_block_parser::cache::{Cache, MemoryCache, PairsCache, RedisCache};
use tron_block_parser::config::Config;
use tron_block_parser::indexer::chain::run_block_loop;
use tron_block_parser::indexer::parser::Parser;
use tron_block_parser::node::http::TronHttpClient;
use tron_block_parser::node::ChainClient;
use tron_block_parser::pricing::QuoteConfig;
use tron_block_parser::publish::StdoutPublisher;
use tron_block_parser::tokens::{PairResolver, TokenRegistry};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Logs go to stderr; stdout carries the published records.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Tron block parser starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    tracing::info!(
        network = %config.chain.network,
        node = %config.chain.node_url,
        receipt_mode = ?config.chain.receipt_mode,
        "Configuration loaded from {}",
        config_path
    );

    let cache: Arc<dyn Cache> = match &config.cache.redis_url {
        Some(url) => {
            let redis = RedisCache::connect(url).await?;
            tracing::info!("Connected to Redis");
            Arc::new(redis)
        }
        None => {
            tracing::warn!("No Redis URL configured, caching in process memory");
            Arc::new(MemoryCache::new())
        }
    };

    let chain: Arc<dyn ChainClient> = Arc::new(TronHttpClient::new(&config.chain)?);

    let registry = Arc::new(TokenRegistry::load(&config.tokens.list_path));
    let quotes = QuoteConfig::load(&config.pricing.quotes_path);

    let pairs = PairsCache::new(
        cache.clone(),
        &config.chain.network,
        Duration::from_secs(config.cache.pair_ttl_secs),
    );
    let resolver = Arc::new(PairResolver::new(chain.clone(), pairs, registry, &config.tokens)?);
    let parser = Parser::new(chain.clone(), cache, resolver, quotes, &config);
    let publisher = StdoutPublisher::new();

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, finishing current block...");
            signal.cancel();
        }
    });

    let grace = Duration::from_secs(config.source.shutdown_grace_secs);
    let network = config.chain.network.clone();
    let worker = run_block_loop(&parser, &publisher, chain.as_ref(), &network, &config.source, shutdown.clone());
    tokio::pin!(worker);

    tokio::select! {
        result = &mut worker => result?,
        _ = shutdown.cancelled() => {
            // The block in flight gets a grace period to finish and publish.
            match tokio::time::timeout(grace, &mut worker).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, abandoning block in flight"),
            }
        }
    }

    tracing::info!("Tron block parser stopped");
    Ok(())
}
