use crate::chunk::{ChunkKey, PriorityTier};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest {
    pub key: ChunkKey,
    pub tier: PriorityTier,
    pub priority: f64,
    order: u64,
}

impl ChunkRequest {
    /// Lower tier first, then higher priority, then earlier enqueue
    fn rank(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then_with(|| other.priority.total_cmp(&self.priority))
            .then_with(|| self.order.cmp(&other.order))
    }

    fn outranks(&self, tier: PriorityTier, priority: f64) -> bool {
        self.tier < tier || (self.tier == tier && self.priority >= priority)
    }
}

/// Requests collected during one priority pass
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: HashMap<ChunkKey, ChunkRequest>,
    next_order: u64,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request. Requesting a key twice keeps the better of the two and the original
    /// enqueue position.
    pub fn request(&mut self, key: ChunkKey, tier: PriorityTier, priority: f64) {
        match self.requests.entry(key) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if !existing.outranks(tier, priority) {
                    existing.tier = tier;
                    existing.priority = priority;
                }
            }
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                entry.insert(ChunkRequest {
                    key,
                    tier,
                    priority,
                    order: self.next_order,
                });
                self.next_order += 1;
            }
        }
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.requests.contains_key(key)
    }

    pub fn get(&self, key: &ChunkKey) -> Option<&ChunkRequest> {
        self.requests.get(key)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.next_order = 0;
    }

    pub fn ordered(&self) -> Vec<ChunkRequest> {
        let mut requests: Vec<ChunkRequest> = self.requests.values().cloned().collect();
        requests.sort_by(ChunkRequest::rank);
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(queue: &RequestQueue) -> Vec<String> {
        queue
            .ordered()
            .into_iter()
            .map(|r| r.key.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_ordering() {
        let mut queue = RequestQueue::new();
        queue.request(ChunkKey::from("prefetch"), PriorityTier::Prefetch, 500.0);
        queue.request(ChunkKey::from("low"), PriorityTier::Visible, 50.0);
        queue.request(ChunkKey::from("high"), PriorityTier::Visible, 100.0);
        queue.request(ChunkKey::from("tie"), PriorityTier::Visible, 50.0);
        assert_eq!(keys(&queue), vec!["high", "low", "tie", "prefetch"]);
    }

    #[test]
    fn test_rerequest_keeps_better() {
        let mut queue = RequestQueue::new();
        queue.request(ChunkKey::from("a"), PriorityTier::Prefetch, 1.0);
        queue.request(ChunkKey::from("b"), PriorityTier::Visible, 10.0);
        queue.request(ChunkKey::from("a"), PriorityTier::Visible, 10.0);
        queue.request(ChunkKey::from("b"), PriorityTier::Prefetch, 900.0);
        assert_eq!(queue.len(), 2);
        let a = queue.get(&ChunkKey::from("a")).unwrap();
        assert_eq!(a.tier, PriorityTier::Visible);
        let b = queue.get(&ChunkKey::from("b")).unwrap();
        assert_eq!((b.tier, b.priority), (PriorityTier::Visible, 10.0));
        // equal rank, so the original enqueue order decides
        assert_eq!(keys(&queue), vec!["a", "b"]);
    }

    #[test]
    fn test_clear() {
        let mut queue = RequestQueue::new();
        queue.request(ChunkKey::from("a"), PriorityTier::Visible, 1.0);
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains(&ChunkKey::from("a")));
    }
}
