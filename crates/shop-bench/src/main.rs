//! Storefront bench CLI
//!
//! Seeds the product store, then compares cached vs. uncached stock reads and
//! substring vs. prefix name search.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use shop_bench::{Comparison, search_comparison, stock_comparison};
use shop_domain::ProductId;
use shop_persistence::{ShopConfig, StorefrontService, seed::DEFAULT_PER_CHARACTER};

#[derive(Parser, Debug)]
#[command(name = "shop-bench")]
#[command(about = "Compare storefront read paths")]
struct Args {
    /// Store URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Redis URL (overrides REDIS_URL)
    #[arg(long)]
    redis_url: Option<String>,

    /// Catalog rows per character
    #[arg(long, default_value_t = DEFAULT_PER_CHARACTER)]
    per_character: u32,

    /// Measurement rounds per comparison
    #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,

    /// Search term
    #[arg(short, long, default_value = "Mr. PX")]
    term: String,

    /// Delay before each stock read from the store (overrides STORE_LATENCY_MS)
    #[arg(long)]
    store_latency_ms: Option<u64>,

    /// Batch-delete every product starting with this prefix after measuring
    #[arg(long)]
    delete_prefix: Option<String>,

    /// Print comparisons as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::registry()
        .with(filter)
        .with(args.log_json.then(|| fmt::layer().json()))
        .with((!args.log_json).then(fmt::layer))
        .init();

    info!(
        version = shop_persistence::VERSION,
        database = %config.database_url,
        redis = config.redis_url.as_deref().unwrap_or("memory"),
        "Starting storefront bench"
    );

    let shop = StorefrontService::connect(&config)
        .await
        .context("connecting to store and cache")?;

    shop.init_stock_product().await?;
    let seeded = shop.seed_catalog(args.per_character).await?;
    info!(?seeded, rows = shop.count().await?, "Catalog ready");

    let comparisons = vec![
        stock_comparison(&shop, args.rounds).await?,
        search_comparison(&shop, &args.term, args.rounds).await?,
    ];
    report(&comparisons, args.json)?;

    if let Some(prefix) = &args.delete_prefix {
        let doomed: Vec<ProductId> = shop
            .find_by_prefix(prefix)
            .await?
            .products
            .iter()
            .map(|p| p.id)
            .collect();
        let outcome = shop.delete_batch(&doomed).await?;
        info!(
            prefix = %prefix,
            removed = outcome.removed,
            remaining = shop.count().await?,
            "Batch delete done"
        );
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ShopConfig> {
    let mut config = ShopConfig::from_env().context("reading configuration")?;

    if let Some(url) = &args.database_url {
        config.database_url.clone_from(url);
    }
    if let Some(url) = &args.redis_url {
        config.redis_url = Some(url.clone());
    }
    if let Some(ms) = args.store_latency_ms {
        config.store_latency = Duration::from_millis(ms);
    }

    Ok(config)
}

fn report(comparisons: &[Comparison], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(comparisons)?);
    } else {
        for comparison in comparisons {
            println!("{comparison}\n");
        }
    }
    Ok(())
}
