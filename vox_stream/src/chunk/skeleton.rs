use super::{ChunkKey, ChunkState};
use vox_containers::prelude::SegmentId;
use vox_decode::SkeletonGeometry;

#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonChunk {
    pub key: ChunkKey,
    pub object_id: SegmentId,
    pub geometry: Option<SkeletonGeometry>,
    pub state: ChunkState,
}

impl SkeletonChunk {
    pub fn new(object_id: SegmentId) -> Self {
        Self {
            key: ChunkKey::manifest(object_id, None),
            object_id,
            geometry: None,
            state: ChunkState::Queued,
        }
    }
}
