//! Preloader - parallel image preloader
//!
//! A CLI tool that loads many images (URLs or local files) at once and
//! reports progress, failures and completion as they settle.
//!
//! Exit codes:
//!   0 - Success (or failures without --fail-on-error)
//!   1 - Runtime error (bad config, unreadable directory, etc.)
//!   2 - At least one resource failed and --fail-on-error was set

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use preloader::cli::{Args, LoadMode};
use preloader::config::{Config, CONFIG_FILE_NAME};
use preloader::report::{self, LoadReport, ReportBuilder};
use preloader::scanner::{DirectoryScanner, ScanConfig};
use preloader::{
    load_each, settle_all, FetchOptions, Identifier, LoadAggregator, LoadSummary, ProgressEvent,
    SourceFetcher,
};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first: general.verbose feeds the log level.
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("Preloader v{}", env!("CARGO_PKG_VERSION"));
    info!("Using configuration from {}", source);
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Preload failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .preloader.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete preload workflow. Returns the exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let identifiers = collect_identifiers(&args, &config)?;
    if identifiers.is_empty() {
        anyhow::bail!("No resources found to load");
    }

    let fetcher = SourceFetcher::new(FetchOptions::from(&config.fetch))?;

    if !args.quiet {
        println!(
            "📥 Loading {} resources ({} mode, timeout {}s)",
            identifiers.len(),
            args.mode.as_str(),
            config.fetch.timeout_seconds
        );
    }

    let load_report = match args.mode {
        LoadMode::Events => run_events(fetcher, identifiers, &args).await?,
        LoadMode::Collect => run_collect(&fetcher, &identifiers, &args).await,
        LoadMode::Callback => run_callback(&fetcher, &identifiers, &args).await,
    };

    if let Some(ref output) = config.general.output {
        let content = report::render(
            &load_report,
            config.report.format,
            config.report.include_resources,
        )?;
        report::save_report(Path::new(output), &content)?;
        info!("Report written to {}", output);
    }

    let summary = &load_report.summary;
    if !args.quiet {
        println!("\n📊 Preload Summary:");
        println!("   Loaded: {} / {}", summary.loaded, summary.total);
        println!("   Failed: {}", summary.failed.len());
        println!("   Bytes: {}", load_report.metadata.bytes_loaded);
        println!("   Duration: {:.2}s", load_report.metadata.duration_seconds);
        if let Some(ref output) = config.general.output {
            println!("\n✅ Report saved to: {}", output);
        }
    }

    if args.fail_on_error && !summary.failed.is_empty() {
        eprintln!(
            "\n⛔ {} resource(s) failed to load. Failing (exit code 2).",
            summary.failed.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Event mode: subscribe to the aggregator's channels and let it run.
async fn run_events(
    fetcher: SourceFetcher,
    identifiers: Vec<Identifier>,
    args: &Args,
) -> Result<LoadReport> {
    let mut aggregator = LoadAggregator::new(fetcher, identifiers)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    aggregator.forward_to(tx);

    if args.show_progress() {
        let pb = progress_bar(aggregator.total() as u64)?;

        let bar = pb.clone();
        aggregator.on_progress(move |e: &ProgressEvent| {
            bar.set_position(e.settled as u64);
            bar.set_message(e.identifier.to_string());
        });

        let bar = pb.clone();
        aggregator.on_error(move |e: &ProgressEvent| {
            bar.set_position(e.settled as u64);
            bar.println(format!("❌ {}", e.identifier));
        });

        aggregator.on_complete(move |_: &ProgressEvent| {
            pb.finish_with_message("all resources settled");
        });
    } else if !args.quiet {
        aggregator.on_progress(|e: &ProgressEvent| {
            println!("✅ {} ({})", e.identifier, percent(e));
        });
        aggregator.on_error(|e: &ProgressEvent| {
            println!("❌ {} ({})", e.identifier, percent(e));
        });
        aggregator.on_complete(|e: &ProgressEvent| {
            println!("🏁 complete ({}, last: {})", percent(e), e.identifier);
        });
    }

    let mut builder = ReportBuilder::new(LoadMode::Events.as_str());
    let summary = aggregator.run().await;

    while let Some(notification) = rx.recv().await {
        builder.record(&notification);
    }

    Ok(builder.finish(summary))
}

/// Collect mode: wait for everything, then list results in input order.
async fn run_collect(
    fetcher: &SourceFetcher,
    identifiers: &[Identifier],
    args: &Args,
) -> LoadReport {
    let mut builder = ReportBuilder::new(LoadMode::Collect.as_str());
    let results = settle_all(fetcher, identifiers).await;

    let mut summary = LoadSummary {
        total: identifiers.len(),
        ..LoadSummary::default()
    };

    for (index, (identifier, result)) in identifiers.iter().zip(&results).enumerate() {
        match result {
            Ok(artifact) => {
                summary.loaded += 1;
                if !args.quiet {
                    println!(
                        "[{}] ✅ {} ({}, {} bytes)",
                        index,
                        identifier,
                        artifact.kind,
                        artifact.len()
                    );
                }
            }
            Err(failure) => {
                summary.failed.push(identifier.clone());
                if !args.quiet {
                    println!("[{}] ❌ {} ({})", index, identifier, failure.reason);
                }
            }
        }
        builder.record_result(identifier, result);
    }

    builder.finish(summary)
}

/// Callback mode: report each result as it settles.
async fn run_callback(
    fetcher: &SourceFetcher,
    identifiers: &[Identifier],
    args: &Args,
) -> LoadReport {
    let mut builder = ReportBuilder::new(LoadMode::Callback.as_str());
    let mut failed = Vec::new();
    let quiet = args.quiet;

    let loaded = load_each(fetcher, identifiers, |result| {
        match &result {
            Ok(artifact) if !quiet => println!("✅ {}", artifact.identifier),
            Err(failure) if !quiet => println!("❌ {}", failure),
            _ => {}
        }
        let identifier = match &result {
            Ok(artifact) => artifact.identifier.clone(),
            Err(failure) => failure.identifier.clone(),
        };
        if result.is_err() {
            failed.push(identifier.clone());
        }
        builder.record_result(&identifier, &result);
    })
    .await;

    builder.finish(LoadSummary {
        total: identifiers.len(),
        loaded,
        failed,
    })
}

fn percent(event: &ProgressEvent) -> String {
    format!("{:.0}%", event.percent_complete * 100.0)
}

fn progress_bar(total: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Gather identifiers from the command line and, if given, --dir.
fn collect_identifiers(args: &Args, config: &Config) -> Result<Vec<Identifier>> {
    let mut identifiers: Vec<Identifier> = args
        .identifiers
        .iter()
        .map(|s| Identifier::new(s.trim()))
        .collect();

    if let Some(ref dir) = args.dir {
        let scanner = DirectoryScanner::new(dir.clone(), ScanConfig::from(&config.scanner));
        let found = scanner.scan()?;
        info!("Found {} images under {}", found.len(), dir.display());
        identifiers.extend(found);
    }

    Ok(identifiers)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so it returns a description of where
/// the configuration came from instead of logging it.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, CONFIG_FILE_NAME.to_string())),
        Ok(None) => Ok((Config::default(), "defaults".to_string())),
        Err(e) => {
            eprintln!(
                "⚠️  Failed to load {}: {:#}. Using defaults.",
                CONFIG_FILE_NAME, e
            );
            Ok((Config::default(), "defaults".to_string()))
        }
    }
}
