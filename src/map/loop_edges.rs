//! Loop candidate list: append-only edges between two trajectory frames.

use parking_lot::RwLock;

use super::types::Timestamp;

/// A discovered loop-closure correspondence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopEdge {
    /// Frame that detected the loop.
    pub current: Timestamp,

    /// Older frame the loop closes back to.
    pub previous: Timestamp,

    /// Detector similarity score.
    pub score: f64,
}

impl LoopEdge {
    pub fn new(current: Timestamp, previous: Timestamp, score: f64) -> Self {
        Self {
            current,
            previous,
            score,
        }
    }
}

/// Read access to loop candidates, as consumed by the visualizer.
///
/// Candidates are indexed by discovery order. Because the list is
/// append-only, `candidate_at(i)` is stable for every `i < count()` once
/// observed.
pub trait LoopCandidateStore: Send + Sync {
    /// Number of candidates discovered so far (never decreases).
    fn count(&self) -> usize;

    fn candidate_at(&self, index: usize) -> Option<LoopEdge>;
}

/// Thread-safe append-only loop candidate list.
#[derive(Default)]
pub struct LoopEdgeStore {
    edges: RwLock<Vec<LoopEdge>>,
}

impl LoopEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edge and return its discovery index.
    pub fn push(&self, edge: LoopEdge) -> usize {
        let mut edges = self.edges.write();
        edges.push(edge);
        edges.len() - 1
    }
}

impl LoopCandidateStore for LoopEdgeStore {
    fn count(&self) -> usize {
        self.edges.read().len()
    }

    fn candidate_at(&self, index: usize) -> Option<LoopEdge> {
        self.edges.read().get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_discovery_index() {
        let store = LoopEdgeStore::new();
        let e = LoopEdge::new(Timestamp(20), Timestamp(10), 0.8);
        assert_eq!(store.push(e), 0);
        assert_eq!(store.push(e), 1);
        assert_eq!(store.count(), 2);
        assert_eq!(store.candidate_at(1), Some(e));
        assert_eq!(store.candidate_at(2), None);
    }
}
