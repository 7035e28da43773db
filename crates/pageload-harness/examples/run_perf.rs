//! Measure a site from a TOML config file
//!
//! Usage: cargo run -p pageload-harness --example run_perf -- <config.toml> [console|json|json-pretty] [report-file]
//!
//! Exits with status 1 when any threshold, budget or outlier check fails.

use anyhow::{Context, Result};
use pageload_harness::config::Config;
use pageload_harness::driver::{ChromeDriver, ChromeOptions};
use pageload_harness::reporter::{OutputFormat, Reporter};
use pageload_harness::runner::PerfRunner;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .context("Usage: run_perf <config.toml> [console|json|json-pretty] [report-file]")?;
    let format: OutputFormat = match args.get(2) {
        Some(format) => format.parse()?,
        None => OutputFormat::Console,
    };

    let config = Config::from_file(config_path)?;

    eprintln!("Starting run: {}", config.run.name);
    eprintln!("  Base URL:   {}", config.run.base_url);
    eprintln!("  Pages:      {}", config.run.pages.join(", "));
    eprintln!("  Iterations: {}", config.run.iterations);
    eprintln!();

    let driver = ChromeDriver::launch(ChromeOptions {
        navigation_timeout: config.run.navigation_timeout,
        ..ChromeOptions::default()
    })
    .await?;

    let runner = PerfRunner::new(driver);
    let result = runner.run(&config).await;
    runner.into_driver().close().await?;
    let report = result?;

    let reporter = Reporter::new(format);
    match args.get(3) {
        Some(path) => {
            reporter.write_to_file(&report, path)?;
            eprintln!("Report written to {}", path);
        }
        None => reporter.report(&report)?,
    }

    std::process::exit(report.exit_code());
}
