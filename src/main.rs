use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::TimeZone;
use clap::{Parser, Subcommand};
use pcmc_scrape::browser::ChromeSession;
use pcmc_scrape::config::{default_config_path, ResolvedConfig};
use pcmc_scrape::credentials::{describe_sources, resolve_credentials, EnvCredentialStore};
use pcmc_scrape::export::{write_transactions, ExportFormat};
use pcmc_scrape::extract::{DateParser, IncrementalExtractor, RowParser};
use pcmc_scrape::models::RowLayout;
use pcmc_scrape::storage::{JsonFileStorage, Storage};
use pcmc_scrape::sync::{PcMastercardSource, ScrapeService};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pcmc-scrape")]
#[command(about = "Incremental PC Mastercard statement scraper")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in, scrape new transactions and save the watermark
    Scrape {
        /// Write transactions here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },
    /// Show the saved watermark and balance
    State,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off",
            )
        }))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Scrape {
            output,
            format,
            headful,
        } => scrape(config, output, format, headful).await,
        Command::State => show_state(&config).await,
        Command::Config => show_config(&config_path, &config),
    }
}

async fn scrape(
    mut config: ResolvedConfig,
    output: Option<PathBuf>,
    format: ExportFormat,
    headful: bool,
) -> Result<()> {
    // Resolve everything fallible before launching a browser.
    let credentials = resolve_credentials(&config.pcmc, &EnvCredentialStore::new())?;

    let storage = Arc::new(JsonFileStorage::new(&config.data_dir));
    let service = ScrapeService::new(storage);
    let prior = service
        .prior_watermark(config.pcmc.most_recent_transaction_date)
        .await?;

    let parser = RowParser::new(RowLayout::default(), DateParser::new(config.timezone));
    let extractor = IncrementalExtractor::new(parser, prior);
    info!(cutoff = extractor.configured_cutoff(), "Starting scrape");

    if headful {
        config.browser.headless = false;
    }
    let session = ChromeSession::launch(&config.browser).await?;
    let mut source = PcMastercardSource::new(session, credentials, extractor);

    let result = service.run(&mut source).await;
    if let Err(err) = source.into_session().close().await {
        tracing::warn!(error = %err, "Failed to close browser");
    }
    let outcome = result?;

    info!(
        balance = outcome.state.remaining_balance.as_deref().unwrap_or_default(),
        most_recent_transaction_date = outcome.state.most_recent_transaction_date,
        "Saved scrape state"
    );

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_transactions(&mut out, format, &outcome.transactions)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_transactions(&mut out, format, &outcome.transactions)?;
        }
    }

    Ok(())
}

async fn show_state(config: &ResolvedConfig) -> Result<()> {
    let storage = JsonFileStorage::new(&config.data_dir);
    let Some(state) = storage.load_state().await? else {
        println!("No scrape has completed yet.");
        return Ok(());
    };

    let mark = config
        .timezone
        .timestamp_millis_opt(state.most_recent_transaction_date)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Most recent transaction: {} ({mark})",
        state.most_recent_transaction_date
    );
    println!(
        "Remaining balance: {}",
        state.remaining_balance.as_deref().unwrap_or("undefined")
    );
    if let Some(at) = state.last_run_at {
        println!("Last run: {}", at.to_rfc3339());
    }
    println!(
        "Ledger: {} transactions",
        storage.get_transactions().await?.len()
    );
    Ok(())
}

fn show_config(config_path: &std::path::Path, config: &ResolvedConfig) -> Result<()> {
    println!("Config file: {}", config_path.display());
    println!("Data directory: {}", config.data_dir.display());
    println!("Timezone: {}", config.timezone.name());
    println!(
        "Browser: {}",
        if config.browser.headless {
            "headless"
        } else {
            "headful"
        }
    );
    if let Some(cutoff) = config.pcmc.most_recent_transaction_date {
        println!("Configured cutoff: {cutoff}");
    }

    println!("Credentials:");
    for (field, source) in describe_sources(&config.pcmc, &EnvCredentialStore::new())? {
        println!(
            "  {:<16}{}",
            field.label(),
            source.as_deref().unwrap_or("missing")
        );
    }
    Ok(())
}
