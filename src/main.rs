use anyhow::{bail, Context, Result};
use clap::Parser;
use days_import::{config::Target, load_table, run_import, Args, Delivery, HttpSink, ImportConfig};
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    // stdout carries the per-row lines, so logs go to stderr
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) resolve configuration ────────────────────────────────────
    let config = ImportConfig::resolve(Args::parse()).context("invalid configuration")?;
    info!(
        source = %config.source_path.display(),
        endpoint = config.target.as_ref().map(|t| t.endpoint.as_str()),
        dry_run = config.dry_run,
        "startup"
    );

    // ─── 3) load the whole table up front ────────────────────────────
    let table = load_table(&config.source_path, config.delimiter)?;
    if table.is_empty() {
        warn!("source has no data rows; nothing to import");
        return Ok(());
    }

    // ─── 4) one pass over the rows ───────────────────────────────────
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = match &config.target {
        Some(Target { endpoint, token }) if !config.dry_run => {
            let sink = HttpSink::new(endpoint.clone(), token.as_str(), config.timeout)?;
            run_import(&table, Delivery::Live(&sink), &mut out)?
        }
        _ => run_import(&table, Delivery::DryRun, &mut out)?,
    };

    // ─── 5) summary ──────────────────────────────────────────────────
    let failed_rows = report.failed_rows();
    if !failed_rows.is_empty() {
        warn!(rows = ?failed_rows, "some rows were not imported");
    }
    if config.strict {
        if let Some(reason) = report.strict_failure() {
            bail!(reason);
        }
    }

    info!("all done");
    Ok(())
}
