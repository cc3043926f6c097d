//! Command-line entry point for the collection tracker.

use anyhow::Result;
use clap::Parser;
use collection_tracker::tracker::report::{render_outcome, OutcomeSummary};
use collection_tracker::tracker::{TrackerBuilder, TrackerConfig};
use collection_tracker::{Chain, Timeframe};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "collection-tracker")]
#[command(about = "Compare NFT collection sales now against an earlier snapshot", long_about = None)]
struct Cli {
    /// Contract address of the collection
    contract_address: String,

    /// Chain identifier (eth-main, arbitrum-main, optimism-main, poly-main, bsc-main, eth-goerli)
    #[arg(short, long, default_value = "eth-main")]
    chain: Chain,

    /// Comparison timeframe (1_DAY, 7_DAYS, 30_DAYS)
    #[arg(short, long, default_value = "1_DAY")]
    timeframe: Timeframe,

    /// Blockspan API key
    #[arg(long, env = "BLOCKSPAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Print the outcome (report, no-data notice or error) as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = TrackerConfig::from_env()?;
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }
    debug!("Using API host {}", config.base_url);

    let session = TrackerBuilder::from_config(config).build()?;

    info!(
        "Comparing {} on {} over {}",
        cli.contract_address, cli.chain, cli.timeframe
    );
    let submission = session
        .submit(&cli.contract_address, cli.chain, cli.timeframe, chrono::Utc::now())
        .await;

    if cli.json {
        let summary = OutcomeSummary::new(&cli.contract_address, cli.chain, &submission.result);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if submission.result.is_ok() {
        print!("{}", render_outcome(&submission.result));
    } else {
        eprint!("{}", render_outcome(&submission.result));
    }

    if submission.result.is_err() {
        std::process::exit(1);
    }

    Ok(())
}
