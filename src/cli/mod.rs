use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use crate::config::{self, ConfigFile};
use crate::notify::LogNotifier;
use crate::scan::orchestrator::{ScanOrchestrator, ScanServices};
use crate::scan::prune;
use crate::storage::catalog::{self, lock};
use crate::storage::db::i64_seconds_to_local_time;
use crate::storage::operations::SqliteCatalog;
use crate::workers::scanner::LoftyExtractor;
use crate::workers::scraper::OfflineScraper;

#[derive(Parser)]
#[command(name = "deckscan")]
#[command(version = "0.1")]
#[command(about = "Scans a local music library into a catalog")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the music roots and update the catalog
    Scan,
    /// Remove catalog entries whose files are gone or outside the music roots
    Prune,
    /// Show catalog status
    Status,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = config::Config::load(&cli.config)?;
    let catalog = catalog::shared(
        SqliteCatalog::new(&cfg.database).context("Failed to open the catalog")?,
    );

    match &cli.command {
        Commands::Scan => {
            let scans = ScanOrchestrator::new(
                ScanServices {
                    catalog: catalog.clone(),
                    notifier: Arc::new(LogNotifier),
                    preferences: Arc::new(ConfigFile {
                        path: cli.config.clone(),
                    }),
                    extractor: Arc::new(LoftyExtractor),
                    scraper: Arc::new(OfflineScraper),
                },
                cfg.workers,
            )?;

            let summary = scans.request_scan().wait()?;
            println!(
                "Scan finished: {} new, {} already known, {} skipped",
                summary.inserted, summary.duplicates, summary.skipped
            );
            println!(
                "Pruned {} tracks ({} outside music roots, {} missing)",
                summary.pruned.removed(),
                summary.pruned.out_of_roots,
                summary.pruned.missing
            );
            if summary.dedup_failures > 0 {
                println!("{} tracks could not be stored, see the log", summary.dedup_failures);
            }

            println!("Updating artists...");
            scans.wait_for_enrichment();
            scans.shutdown();
        }

        Commands::Prune => {
            let report = prune::sweep(&catalog, &cfg.library_source.roots)?;
            println!(
                "Examined {} local tracks, removed {} ({} outside music roots, {} missing)",
                report.examined,
                report.removed(),
                report.out_of_roots,
                report.missing
            );
        }

        Commands::Status => {
            let mut catalog = lock(&catalog);
            println!("Catalog contains {} tracks", catalog.count_tracks()?);
            println!("Catalog knows {} artists", catalog.list_artists()?.len());
            match catalog.last_scan()? {
                Some(at) => println!("Last scan: {}", i64_seconds_to_local_time(at)?),
                None => println!("Library was never scanned. Run \"scan\" to build the catalog"),
            }
        }
    }
    Ok(())
}
