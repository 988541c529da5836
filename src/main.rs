// src/main.rs
// =============================================================================
// Entry point of the rec-crawler CLI.
//
// What happens here:
// 1. Set up logging (tracing, to stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Build the gateways and stores the arguments ask for
// 4. Crawl each keyword, save it, print it
// 5. Exit with a proper code (0 = all keywords crawled, 1 = a search
//    failed, 2 = internal error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, CrawlArgs};
use rec_crawler::crawl::{CrawlConfig, CrawlEngine, CrawlRun};
use rec_crawler::gateway::{FetchGateway, FixtureGateway, HttpGateway, SearchGateway, Timeout};
use rec_crawler::model::{CrawlResult, VideoNode};
use rec_crawler::persist::{run_keyword, FileStore, PersistReport, RecordStore, SnapshotWriter};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays machine readable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,rec_crawler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Show { snapshot, json } => handle_show(&snapshot, json).await,
    }
}

// Handles the 'crawl' subcommand: picks the video source, then crawls
//
// Parameters:
//   args: the parsed crawl arguments
//
// Returns: Result<i32>
//   Success: exit code (0 = every keyword crawled, 1 = a search failed)
//   Error: the gateway or fixture could not be set up
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let deadline = Duration::from_secs(args.fetch_timeout_secs);

    if let Some(api_url) = &args.source.api_url {
        let gateway = Timeout::new(HttpGateway::new(api_url, deadline)?, deadline);
        crawl_keywords(&gateway, &gateway, &args).await
    } else if let Some(path) = &args.source.fixture {
        let gateway = FixtureGateway::load(path)
            .await
            .with_context(|| format!("could not load fixture {}", path.display()))?;
        crawl_keywords(&gateway, &gateway, &args).await
    } else {
        anyhow::bail!("either --api-url or --fixture is required")
    }
}

// Crawls every keyword in turn. A failed search is reported and the next
// keyword still runs.
//
// Parameters:
//   search, fetch: the video source
//   args: the parsed crawl arguments
//
// Returns: Result<i32> with the exit code, or an error if the store
//   could not be opened
async fn crawl_keywords(
    search: &dyn SearchGateway,
    fetch: &dyn FetchGateway,
    args: &CrawlArgs,
) -> Result<i32> {
    let config = CrawlConfig {
        branching_factor: args.branching,
        max_depth: args.max_depth,
    };
    let engine = CrawlEngine::new(search, fetch, config);
    let snapshots = SnapshotWriter::new(&args.results_dir);
    info!(dir = %snapshots.dir().display(), "snapshot directory");

    let store = match &args.store_dir {
        Some(dir) => Some(
            FileStore::open(dir)
                .await
                .with_context(|| format!("could not open store at {}", dir.display()))?,
        ),
        None => None,
    };
    if let Some(store) = &store {
        info!(dir = %store.dir().display(), "document store opened");
    }
    let store = store.as_ref().map(|s| s as &dyn RecordStore);

    let mut results = Vec::new();
    let mut failed_keywords = 0;

    for keyword in &args.keywords {
        if !args.json {
            println!("🔍 Crawling recommendations for: {}", keyword);
            println!(
                "📊 Max depth: {}, branching: {}",
                config.max_depth, config.branching_factor
            );
        }

        let (run, report) =
            match run_keyword(&engine, &snapshots, store, &args.project, keyword).await {
                Ok(done) => done,
                Err(e) => {
                    error!(keyword = %keyword, error = %e, "crawl aborted");
                    eprintln!("❌ {}", e);
                    failed_keywords += 1;
                    continue;
                }
            };

        if !args.json {
            print_run(&run, &report);
        }
        results.push(run.result);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(if failed_keywords > 0 { 1 } else { 0 })
}

// Handles the 'show' subcommand: prints a saved snapshot
//
// Parameters:
//   path: the snapshot file
//   json: print raw JSON instead of a table
//
// Returns: Result<i32>, an error if the file is missing or not a snapshot
async fn handle_show(path: &Path, json: bool) -> Result<i32> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))?;
    let result: CrawlResult = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a crawl snapshot", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("🔍 {} ({})", result.keyword, result.run_date.to_rfc3339());
        print_table(&result.videos);
    }
    Ok(0)
}

// Prints one keyword's table and summary, including what was saved
fn print_run(run: &CrawlRun, report: &PersistReport) {
    print_table(&run.result.videos);

    let stats = run.stats;
    println!("📊 Summary:");
    println!("   🌱 Seeds: {}", stats.seeds);
    println!("   📥 Fetched: {}", stats.fetched);
    println!("   🔁 Revisits: {}", stats.revisits);
    println!("   ✂️  Pruned: {}", stats.pruned);
    println!("   🍃 Left unexplored: {}", stats.leaves);

    match &report.snapshot {
        Some(path) => println!("   💾 Snapshot: {}", path.display()),
        None => println!("   ⚠️  Snapshot not written"),
    }
    if let Some(store) = &report.store {
        println!(
            "   🗄️  Store: {} stored, {} already recorded today, {} failed",
            store.stored, store.skipped, store.failed
        );
    }
    println!();
}

// Prints ranked videos as a human-readable table
//
// Parameters:
//   videos: ranked videos, most recommended first
fn print_table(videos: &[VideoNode]) {
    println!(
        "{:<5} {:<14} {:<50} {:>6} {:>12}",
        "RANK", "ID", "TITLE", "DEPTH", "RECOMMENDED"
    );
    println!("{}", "=".repeat(91));

    for (rank, video) in videos.iter().enumerate() {
        println!(
            "{:<5} {:<14} {:<50} {:>6} {:>12}",
            rank + 1,
            video.id,
            truncate(&video.title, 50),
            video.depth,
            video.recommended_count
        );
    }

    println!();
}

// Shortens text to `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("ññññññ", 5), "ññ...");
    }
}
