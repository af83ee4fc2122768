use crate::id::Uint64;
use dashmap::DashSet;

/// A concurrently mutable set of segment ids.
///
/// Owned by the display/selection layer and shared by reference with anything that reads or
/// mutates the selection. All operations take `&self`, so holders never need exclusive access.
#[derive(Debug, Default)]
pub struct SegmentSet {
    set: DashSet<Uint64>,
}

impl SegmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: Uint64) -> bool {
        self.set.contains(&id)
    }

    /// Returns `true` if the id was not already present
    pub fn add(&self, id: Uint64) -> bool {
        self.set.insert(id)
    }

    pub fn add_all<I: IntoIterator<Item = Uint64>>(&self, ids: I) {
        for id in ids {
            self.set.insert(id);
        }
    }

    /// Returns `true` if the id was present
    pub fn delete(&self, id: Uint64) -> bool {
        self.set.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn clear(&self) {
        self.set.clear();
    }

    /// Sorted snapshot of the current members
    pub fn to_vec(&self) -> Vec<Uint64> {
        let mut ids: Vec<Uint64> = self.set.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<Uint64> for SegmentSet {
    fn from_iter<T: IntoIterator<Item = Uint64>>(iter: T) -> Self {
        let set = SegmentSet::new();
        set.add_all(iter);
        set
    }
}
