use super::{ChunkKey, ChunkState};
use std::collections::BTreeMap;
use vox_containers::prelude::{RootId, SegmentId};

/// Supervoxels of each root within one spatial chunk. Roots already in `mappings` are never
/// requested again.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLeavesChunk {
    pub key: ChunkKey,
    pub grid_position: [u64; 3],
    pub mappings: BTreeMap<RootId, Vec<SegmentId>>,
    pub state: ChunkState,
}

impl GraphLeavesChunk {
    pub fn new(grid_position: [u64; 3]) -> Self {
        let [x, y, z] = grid_position;
        Self {
            key: ChunkKey::new(format!("{x},{y},{z}")),
            grid_position,
            mappings: BTreeMap::new(),
            state: ChunkState::Queued,
        }
    }

    /// Roots from `roots` without a resolved mapping
    pub fn missing_roots(&self, roots: &[RootId]) -> Vec<RootId> {
        roots
            .iter()
            .copied()
            .filter(|root| !self.mappings.contains_key(root))
            .collect()
    }
}
