// src/crawl/mod.rs
// =============================================================================
// This module explores the recommendation graph around a keyword.
//
// Features:
// - Depth-first walk from every search seed, in seed order
// - Configurable depth limit and branching factor
// - Every video fetched at most once per run (visited table)
// - Results ranked by how often each video was recommended
// =============================================================================

mod engine;
mod visited;

pub use engine::{CrawlConfig, CrawlEngine, CrawlRun, CrawlStats};
pub use visited::VisitedTable;
