//! scentdb - load, cache, and inspect the product catalog
//!
//! A command-line front end that loads the catalog through the cache gate,
//! prints it, and warns on stderr when an offline copy had to be used.

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use scentdb::cli::{parse_interval_arg, Cli, CliError, Command, LoadConfig};
use scentdb::data::{parse_with, CatalogRecord, ParseMode};
use scentdb::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use scentdb::render::{render_json, render_table, summary_line};
use scentdb::{CacheGate, Catalog, FileStore, HttpSource};

type BoxError = Box<dyn std::error::Error>;

/// Installs the stderr log subscriber
///
/// `RUST_LOG` applies when no `-v` flag is given; otherwise the flag wins.
fn init_logging(cli: &Cli) {
    let filter = if cli.verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()))
    } else {
        EnvFilter::new(cli.log_filter())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Builds the HTTP-backed, file-cached gate from the load configuration
fn build_gate(config: LoadConfig) -> Result<CacheGate<HttpSource, FileStore>, CliError> {
    let store = match config.cache_dir {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::new().ok_or(CliError::NoCacheDir)?,
    };
    debug!(dir = %store.dir().display(), "using cache directory");

    Ok(CacheGate::with_config(
        HttpSource::new(config.url),
        store,
        config.gate,
    ))
}

fn print_records(records: &[CatalogRecord], json: bool) {
    if json {
        match render_json(records) {
            Ok(text) => println!("{}", text),
            Err(err) => warn!(error = %err, "failed to render catalog as JSON"),
        }
    } else {
        println!("{}", render_table(records));
    }
}

/// Loads the catalog once and prints it
async fn run_show(gate: &CacheGate<HttpSource, FileStore>, json: bool) -> Result<(), BoxError> {
    let mut catalog = Catalog::new();
    catalog.subscribe(move |snapshot| print_records(&snapshot.records, json));
    catalog.on_degraded(|notice| eprintln!("warning: {}", notice));

    let origin = catalog.refresh(gate).await?;
    debug!(?origin, "catalog ready");

    Ok(())
}

/// Parses a local CSV file and prints the records
fn run_parse(file: &Path, strict: bool, json: bool) -> Result<(), BoxError> {
    let text = fs::read_to_string(file)?;
    let mode = if strict {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    };

    let report = parse_with(&text, mode);
    print_records(&report.records, json);

    if report.short_rows > 0 || report.long_rows > 0 {
        eprintln!(
            "note: {} short row(s) dropped, {} row(s) with extra values {}",
            report.short_rows,
            report.long_rows,
            if strict { "dropped" } else { "truncated" }
        );
    }

    Ok(())
}

/// Loads the catalog, then reloads it on an interval until Ctrl-C
async fn run_watch(gate: CacheGate<HttpSource, FileStore>, interval_secs: u64) -> Result<(), BoxError> {
    let interval = parse_interval_arg(interval_secs)?;

    let mut catalog = Catalog::new();
    catalog.on_degraded(|notice| eprintln!("warning: {}", notice));

    match catalog.refresh(&gate).await {
        Ok(origin) => {
            if let Some(snapshot) = catalog.snapshot() {
                println!("{}", summary_line(snapshot, origin));
            }
        }
        Err(err) => eprintln!("error: {}", err),
    }

    let gate = Arc::new(gate);
    let mut handle = RefreshHandle::spawn(
        Arc::clone(&gate),
        RefreshConfig {
            interval,
            enabled: true,
        },
    );

    loop {
        tokio::select! {
            message = handle.recv() => match message {
                Some(RefreshMessage::RefreshStarted) => debug!("refresh started"),
                Some(RefreshMessage::Loaded(outcome)) => {
                    let origin = outcome.origin;
                    catalog.apply(outcome);
                    if let Some(snapshot) = catalog.snapshot() {
                        println!("{}", summary_line(snapshot, origin));
                    }
                }
                Some(RefreshMessage::RefreshError(err)) => eprintln!("error: {}", err),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    match cli.command() {
        Command::Parse { file, strict, json } => run_parse(&file, strict, json),
        Command::Show { json } => {
            let gate = build_gate(LoadConfig::from_cli(&cli)?)?;
            run_show(&gate, json).await
        }
        Command::Watch { interval } => {
            let gate = build_gate(LoadConfig::from_cli(&cli)?)?;
            run_watch(gate, interval).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
