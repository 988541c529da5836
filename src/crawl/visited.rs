// src/crawl/visited.rs
// =============================================================================
// The visited-node table for one crawl run.
//
// This is the single source of truth for a run:
// - every fetched video lives here exactly once (arena + id index)
// - references are tallied per id, even before the video is fetched
// - ids whose fetch failed are remembered so they are never retried
//
// One table belongs to one run. Nothing here is shared or locked.
// =============================================================================

use std::collections::{HashMap, HashSet};

use crate::model::{FetchedVideo, VideoNode};

#[derive(Debug, Default)]
pub struct VisitedTable {
    // Nodes in first-visit order
    nodes: Vec<VideoNode>,
    // id -> position in `nodes`
    index: HashMap<String, usize>,
    // References to ids that have not been fetched (yet)
    pending: HashMap<String, u32>,
    pruned: HashSet<String>,
}

impl VisitedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&VideoNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut VideoNode> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    // Records a first visit. Any references made to this id before it was
    // fetched are credited to the new node.
    //
    // Parameters:
    //   video: the fetched metadata
    //   depth: depth at which the video was first reached
    //
    // Returns: Some(new node), or None when the id is already present (the
    //   existing node is kept untouched)
    pub fn insert(&mut self, video: FetchedVideo, depth: usize) -> Option<&VideoNode> {
        if self.index.contains_key(&video.id) {
            return None;
        }

        let mut node = VideoNode::from_fetched(video, depth);
        node.recommended_count = self.pending.remove(&node.id).unwrap_or(0);

        let position = self.nodes.len();
        self.index.insert(node.id.clone(), position);
        self.nodes.push(node);
        Some(&self.nodes[position])
    }

    /// Counts one reference to `id` from some video's recommendation list
    pub fn record_reference(&mut self, id: &str) {
        match self.get_mut(id) {
            Some(node) => node.recommended_count += 1,
            None => *self.pending.entry(id.to_string()).or_insert(0) += 1,
        }
    }

    // Lowers the recorded depth of `id` if `depth` is shallower.
    // Returns true when the depth changed.
    pub fn lower_depth(&mut self, id: &str, depth: usize) -> bool {
        match self.get_mut(id) {
            Some(node) if depth < node.depth => {
                node.depth = depth;
                true
            }
            _ => false,
        }
    }

    pub fn mark_pruned(&mut self, id: &str) {
        self.pruned.insert(id.to_string());
    }

    pub fn is_pruned(&self, id: &str) -> bool {
        self.pruned.contains(id)
    }

    pub fn pruned_count(&self) -> usize {
        self.pruned.len()
    }

    // Consumes the table and returns its nodes, most recommended first.
    // The sort is stable, so ties keep first-visit order.
    pub fn into_ranked(self) -> Vec<VideoNode> {
        let mut nodes = self.nodes;
        nodes.sort_by(|a, b| b.recommended_count.cmp(&a.recommended_count));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = VisitedTable::new();
        assert!(table.insert(FetchedVideo::new("a", "A"), 2).is_some());
        assert!(table.insert(FetchedVideo::new("a", "Other title"), 0).is_none());

        assert_eq!(table.len(), 1);
        let node = table.get("a").unwrap();
        assert_eq!(node.title, "A");
        assert_eq!(node.depth, 2);
    }

    #[test]
    fn test_pending_references_credited_on_insert() {
        let mut table = VisitedTable::new();
        table.record_reference("a");
        table.record_reference("a");

        let node = table.insert(FetchedVideo::new("a", "A"), 1).unwrap();
        assert_eq!(node.recommended_count, 2);

        table.record_reference("a");
        assert_eq!(table.get("a").unwrap().recommended_count, 3);
    }

    #[test]
    fn test_lower_depth_never_raises() {
        let mut table = VisitedTable::new();
        table.insert(FetchedVideo::new("a", "A"), 2);

        assert!(!table.lower_depth("a", 3));
        assert_eq!(table.get("a").unwrap().depth, 2);

        assert!(table.lower_depth("a", 1));
        assert_eq!(table.get("a").unwrap().depth, 1);

        assert!(!table.lower_depth("missing", 0));
    }

    #[test]
    fn test_into_ranked_sorts_descending() {
        let mut table = VisitedTable::new();
        for id in ["a", "b", "c"] {
            table.insert(FetchedVideo::new(id, id), 0);
        }
        table.record_reference("c");
        table.record_reference("c");
        table.record_reference("b");

        let ranked: Vec<_> = table.into_ranked().into_iter().map(|n| n.id).collect();
        assert_eq!(ranked, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_pruned_ids_tracked() {
        let mut table = VisitedTable::new();
        table.mark_pruned("x");
        table.mark_pruned("x");

        assert!(table.is_pruned("x"));
        assert!(!table.contains("x"));
        assert_eq!(table.pruned_count(), 1);
    }
}
