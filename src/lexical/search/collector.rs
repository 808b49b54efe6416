//! Top-k collection.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A scored match before hydration.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub score: f32,
    pub id: String,
    pub segment: usize,
    pub ordinal: u32,
}

impl Candidate {
    /// Higher score first, then smaller id first.
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other)
    }
}

/// Keeps the `k` best candidates seen so far.
#[derive(Debug)]
pub(crate) struct TopDocsCollector {
    k: usize,
    heap: BinaryHeap<Reverse<Candidate>>,
    total_hits: usize,
}

impl TopDocsCollector {
    pub fn new(k: usize) -> Self {
        TopDocsCollector {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
            total_hits: 0,
        }
    }

    pub fn collect(&mut self, candidate: Candidate) {
        self.total_hits += 1;
        if self.k == 0 {
            return;
        }
        if self.heap.len() == self.k
            && let Some(Reverse(worst)) = self.heap.peek()
            && candidate <= *worst
        {
            return;
        }
        self.heap.push(Reverse(candidate));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    pub fn total_hits(&self) -> usize {
        self.total_hits
    }

    /// Best candidate first.
    pub fn into_sorted(self) -> Vec<Candidate> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(candidate)| candidate)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f32) -> Candidate {
        Candidate {
            score,
            id: id.to_string(),
            segment: 0,
            ordinal: 0,
        }
    }

    #[test]
    fn test_keeps_best_k_in_order() {
        let mut collector = TopDocsCollector::new(2);
        for (id, score) in [("a", 1.0), ("b", 3.0), ("c", 2.0), ("d", 0.5)] {
            collector.collect(candidate(id, score));
        }
        assert_eq!(collector.total_hits(), 4);
        let ids: Vec<_> = collector.into_sorted().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_ties_break_by_id() {
        let mut collector = TopDocsCollector::new(2);
        for id in ["z", "m", "a"] {
            collector.collect(candidate(id, 1.0));
        }
        let ids: Vec<_> = collector.into_sorted().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "m"]);
    }

    #[test]
    fn test_zero_k_counts_only() {
        let mut collector = TopDocsCollector::new(0);
        collector.collect(candidate("a", 1.0));
        assert_eq!(collector.total_hits(), 1);
        assert!(collector.into_sorted().is_empty());
    }
}
