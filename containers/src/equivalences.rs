use crate::id::Uint64;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Union-find over segment ids with path compression and union by rank.
#[derive(Debug, Default, Clone)]
pub struct DisjointSets {
    parent: HashMap<Uint64, Uint64>,
    rank: HashMap<Uint64, u32>,
    /// Smallest member of each class, keyed by the class root
    min: HashMap<Uint64, Uint64>,
}

impl DisjointSets {
    fn find(&mut self, id: Uint64) -> Uint64 {
        let mut root = id;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }
        let mut cursor = id;
        while cursor != root {
            match self.parent.insert(cursor, root) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        root
    }

    fn find_readonly(&self, id: Uint64) -> Uint64 {
        let mut root = id;
        while let Some(&parent) = self.parent.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }
        root
    }

    fn ensure(&mut self, id: Uint64) {
        if !self.parent.contains_key(&id) {
            self.parent.insert(id, id);
            self.rank.insert(id, 0);
            self.min.insert(id, id);
        }
    }

    /// Returns `true` if the two ids were in different classes
    pub fn link(&mut self, a: Uint64, b: Uint64) -> bool {
        self.ensure(a);
        self.ensure(b);
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        let rank_a = self.rank.get(&root_a).copied().unwrap_or(0);
        let rank_b = self.rank.get(&root_b).copied().unwrap_or(0);
        let (winner, loser) = if rank_a >= rank_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent.insert(loser, winner);
        if rank_a == rank_b {
            self.rank.insert(winner, rank_a + 1);
        }
        let min_loser = self.min.remove(&loser).unwrap_or(loser);
        let min_winner = self.min.get(&winner).copied().unwrap_or(winner);
        self.min.insert(winner, min_winner.min(min_loser));
        true
    }

    pub fn get_representative(&self, id: Uint64) -> Uint64 {
        if !self.parent.contains_key(&id) {
            return id;
        }
        let root = self.find_readonly(id);
        self.min.get(&root).copied().unwrap_or(root)
    }

    pub fn members(&self, id: Uint64) -> Vec<Uint64> {
        if !self.parent.contains_key(&id) {
            return vec![id];
        }
        let root = self.find_readonly(id);
        let mut members: Vec<Uint64> = self
            .parent
            .keys()
            .copied()
            .filter(|member| self.find_readonly(*member) == root)
            .collect();
        members.sort_unstable();
        members
    }

    pub fn clear(&mut self) {
        self.parent.clear();
        self.rank.clear();
        self.min.clear();
    }
}

/// Shared segment equivalence structure.
///
/// Each equivalence class is represented by its smallest member. An id that was never linked
/// is its own class.
#[derive(Debug, Default)]
pub struct SegmentEquivalences {
    sets: RwLock<DisjointSets>,
}

impl SegmentEquivalences {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, DisjointSets> {
        self.sets.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DisjointSets> {
        self.sets.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Merge the classes of `a` and `b`
    pub fn link(&self, a: Uint64, b: Uint64) -> bool {
        self.write().link(a, b)
    }

    pub fn get_representative(&self, id: Uint64) -> Uint64 {
        self.read().get_representative(id)
    }

    pub fn same_set(&self, a: Uint64, b: Uint64) -> bool {
        let sets = self.read();
        sets.get_representative(a) == sets.get_representative(b)
    }

    /// Sorted members of the class containing `id`
    pub fn members(&self, id: Uint64) -> Vec<Uint64> {
        self.read().members(id)
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlinked_is_own_representative() {
        let eq = SegmentEquivalences::new();
        assert_eq!(eq.get_representative(Uint64(42)), Uint64(42));
        assert_eq!(eq.members(Uint64(42)), vec![Uint64(42)]);
    }

    #[test]
    fn test_link_transitive() {
        let eq = SegmentEquivalences::new();
        assert!(eq.link(Uint64(5), Uint64(6)));
        assert!(eq.link(Uint64(7), Uint64(6)));
        assert!(!eq.link(Uint64(5), Uint64(7)));
        assert!(eq.same_set(Uint64(5), Uint64(7)));
        assert!(!eq.same_set(Uint64(5), Uint64(8)));
        assert_eq!(eq.get_representative(Uint64(7)), Uint64(5));
        assert_eq!(eq.members(Uint64(6)), vec![Uint64(5), Uint64(6), Uint64(7)]);
    }

    #[test]
    fn test_representative_is_min_after_many_links() {
        let mut sets = DisjointSets::default();
        for i in (1..50u64).rev() {
            sets.link(Uint64(i), Uint64(i + 1));
        }
        assert_eq!(sets.get_representative(Uint64(50)), Uint64(1));
        assert_eq!(sets.members(Uint64(20)).len(), 50);
        sets.clear();
        assert_eq!(sets.get_representative(Uint64(50)), Uint64(50));
    }
}
