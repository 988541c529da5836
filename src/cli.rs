// src/cli.rs
// =============================================================================
// The command-line interface, defined with clap's derive API.
//
// Subcommands:
// - crawl: crawl one or more keywords and save the results
// - show: print a saved snapshot as a ranked table
//
// Every crawl setting can also come from an environment variable, so the
// tool can be driven from a cron job or container without long command
// lines. Flags win over the environment.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rec-crawler",
    version,
    about = "Map the recommendation graph around keyword search results",
    long_about = "rec-crawler searches for a keyword, follows the recommendations of each result \
                  up to a depth and branching limit, and ranks every video it reached by how \
                  often it was recommended."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the recommendation graph for one or more keywords
    ///
    /// Example: rec-crawler crawl "lofi hip hop" --api-url http://localhost:8080 --max-depth 2
    Crawl(CrawlArgs),

    /// Print a saved snapshot file as a ranked table
    ///
    /// Example: rec-crawler show results/lofi-hip-hop-2024-05-01T08-30-00Z.json
    Show {
        /// Snapshot file written by a previous crawl
        snapshot: PathBuf,

        /// Print the snapshot as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Keywords to crawl, one run each, in the order given
    #[arg(required = true)]
    pub keywords: Vec<String>,

    /// Deepest level that is fetched (search results are depth 0)
    #[arg(long, env = "CRAWL_MAX_DEPTH", default_value_t = 1)]
    pub max_depth: usize,

    /// How many recommendations are followed from each video
    #[arg(long, env = "CRAWL_BRANCHING", default_value_t = 1)]
    pub branching: usize,

    /// Directory the JSON snapshots are written to
    #[arg(long, env = "CRAWL_RESULTS_DIR", default_value = "results")]
    pub results_dir: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory of the document store; without it only snapshots are written
    #[arg(long, env = "CRAWL_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Project the store records belong to
    #[arg(long, env = "CRAWL_PROJECT", default_value = "default")]
    pub project: String,

    /// Deadline for each search or fetch against the API, in seconds
    #[arg(long, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Print the ranked results as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Where seeds and videos come from (exactly one)
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Base URL of the JSON video API
    #[arg(long, env = "CRAWL_API_URL")]
    pub api_url: Option<String>,

    /// JSON fixture file holding searches and videos, for offline runs
    #[arg(long)]
    pub fixture: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crawl_with_fixture() {
        let cli = Cli::try_parse_from([
            "rec-crawler",
            "crawl",
            "cats",
            "dogs",
            "--fixture",
            "graph.json",
            "--max-depth",
            "3",
            "--branching",
            "2",
        ])
        .unwrap();

        let Commands::Crawl(args) = cli.command else {
            panic!("expected crawl subcommand");
        };
        assert_eq!(args.keywords, vec!["cats", "dogs"]);
        assert_eq!(args.max_depth, 3);
        assert_eq!(args.branching, 2);
        assert_eq!(args.source.fixture, Some(PathBuf::from("graph.json")));
        assert!(args.store_dir.is_none());
    }

    #[test]
    fn test_api_url_and_fixture_conflict() {
        let result = Cli::try_parse_from([
            "rec-crawler",
            "crawl",
            "cats",
            "--api-url",
            "http://localhost:8080",
            "--fixture",
            "graph.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_keyword_required() {
        let result = Cli::try_parse_from(["rec-crawler", "crawl", "--fixture", "graph.json"]);
        assert!(result.is_err());
    }
}
