// src/crawl/engine.rs
// =============================================================================
// The crawl engine: keyword -> seeds -> depth-first expansion -> ranking.
//
// How a run works:
// 1. Ask the search gateway for seed videos (failure aborts the run)
// 2. Expand each seed, in order, with a depth-first walk
// 3. Rank everything in the visited table by how often it was recommended
//
// How one frame {stub, depth} is handled:
// - depth > max_depth: a leaf, reported upward, never fetched
// - id already visited: a revisit, the depth may go down, nothing is fetched
//   and nothing is explored (children are only followed from the first visit)
// - id already failed this run: skipped
// - otherwise: fetch it, store it, and push its first `branching_factor`
//   recommendations at depth + 1
//
// The walk uses an explicit stack instead of recursion. Children are pushed
// in reverse so they pop in list order, which gives the same visiting order
// as a recursive pre-order walk.
// =============================================================================

use chrono::Utc;
use tracing::{debug, info, warn};

use super::visited::VisitedTable;
use crate::error::CrawlError;
use crate::gateway::{FetchGateway, SearchGateway};
use crate::model::{CrawlResult, VideoStub};

/// Traversal bounds, resolved once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Max recommendations followed per video
    pub branching_factor: usize,
    /// Deepest level that is still fetched (seeds are depth 0)
    pub max_depth: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            branching_factor: 1,
            max_depth: 1,
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub seeds: usize,
    pub fetched: usize,
    pub pruned: usize,
    pub revisits: usize,
    pub leaves: usize,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct CrawlRun {
    pub result: CrawlResult,
    // Stubs reported upward by the walk: leaves past max_depth and the
    // followed recommendations of revisited videos. Informational only.
    pub frontier: Vec<VideoStub>,
    pub stats: CrawlStats,
}

// One unit of pending work on the stack
#[derive(Debug, Clone)]
struct Frame {
    stub: VideoStub,
    depth: usize,
}

// What to do with a frame, decided before any I/O happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Leaf,
    Revisit,
    Skip,
    Fetch,
}

pub struct CrawlEngine<'a> {
    search: &'a dyn SearchGateway,
    fetch: &'a dyn FetchGateway,
    config: CrawlConfig,
}

impl<'a> CrawlEngine<'a> {
    pub fn new(
        search: &'a dyn SearchGateway,
        fetch: &'a dyn FetchGateway,
        config: CrawlConfig,
    ) -> Self {
        Self {
            search,
            fetch,
            config,
        }
    }

    // Crawls the neighbourhood of `keyword` and ranks what was found
    //
    // Parameters:
    //   keyword: the search term whose results are used as seeds
    //
    // Returns: Result<CrawlRun, CrawlError>
    //   Success: the ranked videos, the reported frontier and run counters
    //   Error: SearchUnavailable if the seeds could not be fetched
    //          (nothing else is fetched in that case)
    //
    // Each call gets its own visited table, so runs never see each other's
    // state.
    pub async fn run(&self, keyword: &str) -> Result<CrawlRun, CrawlError> {
        let seeds = self
            .search
            .search(keyword)
            .await
            .map_err(|reason| CrawlError::SearchUnavailable {
                keyword: keyword.to_string(),
                reason,
            })?;

        info!(keyword, seeds = seeds.len(), "seed videos found");
        for (position, seed) in seeds.iter().enumerate() {
            info!("  {} - {}", position + 1, seed.title);
        }

        let mut table = VisitedTable::new();
        let mut stats = CrawlStats {
            seeds: seeds.len(),
            ..CrawlStats::default()
        };
        let mut frontier = Vec::new();

        for seed in seeds {
            info!(id = %seed.id, title = %seed.title, "starting from seed");
            let reported = self.expand(&mut table, seed, 0, &mut stats).await;
            frontier.extend(reported);
        }

        // Failed ids are remembered by the table, count them from there
        stats.pruned = table.pruned_count();
        if table.is_empty() {
            warn!(keyword, "no video could be fetched for this keyword");
        }
        debug!(keyword, visited = table.len(), "ranking visited videos");

        let videos = table.into_ranked();
        info!(
            keyword,
            videos = videos.len(),
            fetched = stats.fetched,
            pruned = stats.pruned,
            revisits = stats.revisits,
            leaves = stats.leaves,
            "crawl finished"
        );

        Ok(CrawlRun {
            result: CrawlResult {
                keyword: keyword.to_string(),
                run_date: Utc::now(),
                videos,
            },
            frontier,
            stats,
        })
    }

    // Walks depth-first from `stub`, recording fetched videos in `table`
    //
    // Parameters:
    //   table: the visited table of the current run (mutated in place)
    //   stub: where the walk starts
    //   depth: depth of `stub` (0 for a seed)
    //   stats: run counters, bumped as frames are handled
    //
    // Returns: the stubs this walk reports upward (see CrawlRun::frontier)
    pub async fn expand(
        &self,
        table: &mut VisitedTable,
        stub: VideoStub,
        depth: usize,
        stats: &mut CrawlStats,
    ) -> Vec<VideoStub> {
        let mut stack = vec![Frame { stub, depth }];
        let mut reported = Vec::new();

        while let Some(frame) = stack.pop() {
            match self.classify(table, &frame) {
                Visit::Leaf => {
                    stats.leaves += 1;
                    reported.push(frame.stub);
                }
                Visit::Revisit => {
                    stats.revisits += 1;
                    let shallower = table.lower_depth(&frame.stub.id, frame.depth);
                    debug!(
                        depth = frame.depth,
                        id = %frame.stub.id,
                        shallower,
                        "revisit"
                    );

                    if let Some(node) = table.get(&frame.stub.id) {
                        reported.extend_from_slice(
                            node.followed_recommendations(self.config.branching_factor),
                        );
                    }
                }
                Visit::Skip => {
                    debug!(depth = frame.depth, id = %frame.stub.id, "skipping failed video");
                }
                Visit::Fetch => {
                    let children = self.fetch_and_record(table, &frame, stats).await;
                    for child in children.into_iter().rev() {
                        stack.push(Frame {
                            stub: child,
                            depth: frame.depth + 1,
                        });
                    }
                }
            }
        }

        reported
    }

    // Decides what happens to a frame, looking only at the table
    //
    // The order matters: the depth limit is checked before the table, so a
    // stub past max_depth is a leaf even when it was already visited.
    fn classify(&self, table: &VisitedTable, frame: &Frame) -> Visit {
        if frame.depth > self.config.max_depth {
            Visit::Leaf
        } else if table.contains(&frame.stub.id) {
            Visit::Revisit
        } else if table.is_pruned(&frame.stub.id) {
            Visit::Skip
        } else {
            Visit::Fetch
        }
    }

    // First visit: fetch the video, store it, count its outgoing references
    //
    // Parameters:
    //   table: the visited table (gets the new node, or the pruned id)
    //   frame: the stub being visited and its depth
    //   stats: run counters
    //
    // Returns: the recommendations to follow from this video, already
    //   truncated to the branching factor. Empty when the fetch failed.
    async fn fetch_and_record(
        &self,
        table: &mut VisitedTable,
        frame: &Frame,
        stats: &mut CrawlStats,
    ) -> Vec<VideoStub> {
        debug!(
            "{}| {} | {} | {}",
            "----".repeat(frame.depth),
            frame.depth,
            frame.stub.id,
            frame.stub.title
        );

        let video = match self.fetch.fetch(&frame.stub).await {
            Ok(video) => video,
            Err(e) => {
                warn!(
                    depth = frame.depth,
                    id = %frame.stub.id,
                    title = %frame.stub.title,
                    error = %e,
                    "video could not be fetched, pruning branch"
                );
                table.mark_pruned(&frame.stub.id);
                return Vec::new();
            }
        };

        // The answer must be for the id that was asked about (no aliases)
        if video.id != frame.stub.id {
            warn!(
                depth = frame.depth,
                id = %frame.stub.id,
                returned = %video.id,
                "fetch answered with a different video, pruning branch"
            );
            table.mark_pruned(&frame.stub.id);
            return Vec::new();
        }

        stats.fetched += 1;
        let node = match table.insert(video, frame.depth) {
            Some(node) => node,
            // already in the table: its children were followed on first visit
            None => return Vec::new(),
        };
        let children = node
            .followed_recommendations(self.config.branching_factor)
            .to_vec();

        for child in &children {
            table.record_reference(&child.id);
        }

        children
    }
}
