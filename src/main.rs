// src/main.rs
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use tokio::sync::mpsc;

use beszamolo_extractor::config::{BrowserbaseConfig, ScraperConfig, Vocabulary};
use beszamolo_extractor::export::{write_report, ExportFormat};
use beszamolo_extractor::portal::{BrowserbaseProvider, ScrapeEvent, ScrapeRequest, Scraper, SearchKind, DEFAULT_YEAR};
use beszamolo_extractor::utils::{self, AppError};

/// Fetch a company's annual financial statements from e-beszámoló
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("company").required(true).args(["tax_number", "name"])))]
struct Args {
    /// Hungarian tax number (the first eight digits are used)
    #[arg(short, long)]
    tax_number: Option<String>,

    /// Registered company name; the legal form suffix is optional
    #[arg(short, long)]
    name: Option<String>,

    /// Fiscal year of the report
    #[arg(short, long, default_value_t = DEFAULT_YEAR)]
    year: i32,

    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,

    /// Write the export here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print progress events as newline-delimited JSON on stdout
    #[arg(long)]
    ndjson: bool,

    /// Debug mode - save annotated snapshots of every analysed page here
    #[arg(short, long)]
    debug_dir: Option<PathBuf>,

    /// JSON file overriding the built-in portal vocabulary
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// Wall-clock budget for the whole navigation, in seconds
    #[arg(long, default_value_t = 60)]
    budget_secs: u64,

    /// Keep the browser open this long after finishing, in seconds
    #[arg(long, default_value_t = 5)]
    hold_secs: u64,
}

impl Args {
    fn request(&self) -> Result<ScrapeRequest, AppError> {
        let (search_type, search_value) = match (&self.tax_number, &self.name) {
            (Some(tax), _) => (SearchKind::TaxId, tax.clone()),
            (None, Some(name)) => (SearchKind::Name, name.clone()),
            (None, None) => return Err(AppError::Config("Either --tax-number or --name is required".to_string())),
        };
        Ok(ScrapeRequest { search_type, search_value, year: self.year })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting extraction for args: {:?}", args);
    let request = args.request()?;

    // 3. Configuration
    let vocabulary = match &args.vocabulary {
        Some(path) => Vocabulary::from_path(path)?,
        None => Vocabulary::default(),
    };
    let config = ScraperConfig {
        run_budget: Duration::from_secs(args.budget_secs),
        hold_open: Duration::from_secs(args.hold_secs),
        debug_dir: args.debug_dir.clone(),
        ..ScraperConfig::default()
    };
    let provider = BrowserbaseProvider::new(BrowserbaseConfig::from_env()?)?;
    let scraper = Scraper::new(provider, config, vocabulary);

    // 4. Progress events
    let (tx, mut rx) = mpsc::unbounded_channel::<ScrapeEvent>();
    let ndjson = args.ndjson;
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if ndjson {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                }
            } else if let ScrapeEvent::LiveView { live_view_url, .. } = &event {
                tracing::info!("Watch the browser live: {}", live_view_url);
            }
        }
    });

    // 5. Run
    let outcome = scraper.run(&request, &tx).await;
    drop(tx);
    if let Err(e) = printer.await {
        tracing::warn!("Event printer stopped: {}", e);
    }
    let report = outcome?;

    // 6. Export
    match &args.output {
        Some(path) => {
            write_report(&report, args.format, File::create(path)?)?;
            tracing::info!("Saved report to {}", path.display());
        }
        None if !args.ndjson => write_report(&report, args.format, io::stdout().lock())?,
        // The result event already carried the report.
        None => {}
    }

    Ok(())
}
