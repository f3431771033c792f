use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autoredeem::config::RedeemConfig;
use autoredeem::driver::ChromiumDriver;
use autoredeem::duration::parse_duration;
use autoredeem::redeem::AutoRedeemer;
use autoredeem::session::StdinPrompter;

#[derive(Parser)]
#[command(name = "autoredeem")]
#[command(about = "Redeem a code against the service, reusing a saved session")]
struct Cli {
    /// The redemption code to submit
    code: String,

    /// Perform every step except the final confirm click
    #[arg(long)]
    dry_run: bool,

    /// Show the browser window (default is headless)
    #[arg(long)]
    headed: bool,

    /// Maximum wait for any UI condition, e.g. "30s" or "2m"
    #[arg(long)]
    timeout: Option<String>,

    /// Path to config file
    #[arg(short, long, default_value = "autoredeem.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(!cli.code.trim().is_empty(), "Code must be non-empty");

    let mut config = RedeemConfig::load_or_default(&cli.config)?;
    if cli.dry_run {
        config.dry_run = true;
    }
    if cli.headed {
        config.headless = false;
    }
    if let Some(timeout) = &cli.timeout {
        config.timeout = parse_duration(timeout)?;
    }

    // Eager session acquisition: any interactive login happens here,
    // before the code is touched.
    let mut redeemer =
        AutoRedeemer::new(config, Arc::new(ChromiumDriver::new()), Arc::new(StdinPrompter)).await?;

    let start = Instant::now();
    let outcome = redeemer.redeem(cli.code.trim()).await;
    info!(
        outcome = outcome.as_str(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Redemption finished"
    );

    println!("{outcome}");
    Ok(())
}
