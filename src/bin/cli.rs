//! salescan CLI
//!
//! Local execution entry point.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use salescan::{
    error::Result,
    models::{BrandConfig, Config},
    pipeline,
    services::BrandEvaluator,
    storage::{LocalStorage, SnapshotStorage},
    utils::http::HttpFetcher,
};

/// salescan - Brand Sale Scanner
#[derive(Parser, Debug)]
#[command(
    name = "salescan",
    version,
    about = "Detects running sales on brand websites"
)]
struct Cli {
    /// Path to storage directory containing config and sheets
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan every enabled brand and overwrite the snapshot
    Scan {
        /// Brand sheet: path relative to the storage directory, or a CSV URL
        #[arg(long)]
        brands: Option<String>,

        /// Snapshot path relative to the storage directory
        #[arg(long)]
        output: Option<String>,

        /// Emit only brands currently on sale
        #[arg(long)]
        sales_only: bool,
    },

    /// Evaluate a single URL and print the result as JSON
    Check {
        url: String,

        /// Brand name used for override lookup and display
        #[arg(long, default_value = "")]
        brand: String,
    },

    /// Validate configuration, patterns and the local brand sheet
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    log::debug!("Loaded configuration from {}", config_path.display());

    let storage = LocalStorage::new(&cli.storage_dir);
    let today = Local::now().date_naive();

    match cli.command {
        Command::Scan {
            brands,
            output,
            sales_only,
        } => {
            if let Some(brands) = brands {
                config.sources.brands = brands;
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            config.output.sales_only |= sales_only;
            config.validate()?;

            let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
            let config = Arc::new(config);
            pipeline::run_scan(config, fetcher, &storage, &cli.storage_dir, today).await?;
        }

        Command::Check { url, brand } => {
            let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
            let evaluator = BrandEvaluator::new(Arc::new(config), fetcher)?;
            let brand = BrandConfig::new(brand.clone(), brand, url);
            let result = evaluator.evaluate(&brand, today).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Validate => {
            if let Err(e) = pipeline::run_validate(&config, &cli.storage_dir) {
                log::error!("Validation failed: {}", e);
                return Err(e);
            }
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            match storage.load_report(&config.output.path).await? {
                Some(report) => {
                    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
                    for sale in &report.sales {
                        *by_status.entry(sale.status.as_str()).or_default() += 1;
                    }
                    log::info!("Snapshot: {}", storage.path(&config.output.path).display());
                    log::info!("Generated at: {}", report.generated_at);
                    log::info!("Records: {}", report.sales.len());
                    for (status, count) in by_status {
                        log::info!("  {status}: {count}");
                    }
                    log::info!("Editorials: {}", report.editorials.len());
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    Ok(())
}
