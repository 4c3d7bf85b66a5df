// src/main.rs
// =============================================================================
// This is the entry point of the crawler CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (RUST_LOG, default "info")
// 3. Build the engine, start it and wait for the visited URLs
// 4. Print them and exit with a code describing how the crawl ended
//
// Exit codes:
//   0 = target reached
//   1 = site ran out of in-scope links before the target
//   2 = error (bad URL, bad flags, crawl task failure)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use serde::Serialize;
use site_crawler::{CrawlStats, Engine, StopReason};

use cli::Cli;

#[derive(Debug, Serialize)]
struct Report<'a> {
    seed: &'a str,
    target: usize,
    outcome: Option<StopReason>,
    stats: CrawlStats,
    visited: &'a [String],
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut engine = Engine::with_fetch_config(&cli.url, cli.crawl_config(), &cli.fetch_config())
        .with_context(|| format!("cannot crawl {}", cli.url))?;

    engine.run()?;
    let visited = engine.await_result().await?;

    let report = Report {
        seed: engine.seed(),
        target: engine.target(),
        outcome: engine.outcome(),
        stats: engine.stats(),
        visited: &visited,
    };
    print_report(&report, cli.json)?;

    match report.outcome {
        Some(StopReason::FrontierExhausted) => Ok(1),
        _ => Ok(0),
    }
}

fn print_report(report: &Report<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for url in report.visited {
        println!("{}", url);
    }

    println!();
    println!("Visited: {} / {}", report.visited.len(), report.target);
    println!("Fetched: {}", report.stats.fetched);
    println!("Failed:  {}", report.stats.failed);
    if report.outcome == Some(StopReason::FrontierExhausted) {
        println!("Ran out of in-scope links before reaching the target");
    }

    Ok(())
}
