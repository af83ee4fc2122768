use super::{ChunkKey, ChunkState};
use crate::bounds::VoxelBounds;
use vox_containers::prelude::SegmentId;

/// Per-object list of fragment ids. `fragment_ids` stays `None` until a download succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestChunk {
    pub key: ChunkKey,
    pub object_id: SegmentId,
    pub clip_bounds: Option<VoxelBounds>,
    pub fragment_ids: Option<Vec<String>>,
    pub state: ChunkState,
    /// The graph fallback already ran for the current failure
    pub children_requested: bool,
}

impl ManifestChunk {
    pub fn new(object_id: SegmentId, clip_bounds: Option<VoxelBounds>) -> Self {
        Self {
            key: ChunkKey::manifest(object_id, clip_bounds.as_ref()),
            object_id,
            clip_bounds,
            fragment_ids: None,
            state: ChunkState::Queued,
            children_requested: false,
        }
    }

    pub fn fragment_keys(&self) -> Vec<ChunkKey> {
        self.fragment_ids
            .iter()
            .flatten()
            .map(|id| ChunkKey::fragment(&self.key, id))
            .collect()
    }
}
