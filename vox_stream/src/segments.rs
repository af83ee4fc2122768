use std::sync::Arc;
use vox_containers::prelude::{RootId, SegmentEquivalences, SegmentId, SegmentSet};

/// Display state owned by the selection layer. The scheduler only reads and mutates it through
/// the set and equivalence operations, and other owners may change it at any time.
#[derive(Debug, Clone, Default)]
pub struct DisplaySegments {
    pub root_segments: Arc<SegmentSet>,
    pub visible_segments_3d: Arc<SegmentSet>,
    pub equivalences: Arc<SegmentEquivalences>,
}

impl DisplaySegments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root a visible segment currently resolves to.
    ///
    /// This is the member of the segment's equivalence class that is in the root set. Root ids
    /// are usually larger than the ids linked to them, so the class representative is only used
    /// when no member is a selected root.
    pub fn root_of(&self, segment: SegmentId) -> RootId {
        if self.root_segments.has(segment) {
            return segment;
        }
        self.equivalences
            .members(segment)
            .into_iter()
            .find(|member| self.root_segments.has(*member))
            .unwrap_or_else(|| self.equivalences.get_representative(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_containers::prelude::Uint64;

    fn id(value: u64) -> Uint64 {
        Uint64::new(value)
    }

    #[test]
    fn test_root_of_prefers_selected_root() {
        let segments = DisplaySegments::new();
        segments.root_segments.add(id(100));
        segments.equivalences.link(id(100), id(5));
        segments.equivalences.link(id(100), id(60));
        assert_eq!(segments.root_of(id(5)), id(100));
        assert_eq!(segments.root_of(id(60)), id(100));
        assert_eq!(segments.root_of(id(100)), id(100));
    }

    #[test]
    fn test_root_of_without_selected_root() {
        let segments = DisplaySegments::new();
        segments.equivalences.link(id(100), id(5));
        assert_eq!(segments.root_of(id(100)), id(5));
        assert_eq!(segments.root_of(id(7)), id(7));
    }
}
