use super::{ChunkKey, ChunkState};
use crate::bounds::VoxelBounds;
use vox_decode::VolumeData;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeChunk {
    pub key: ChunkKey,
    pub grid_position: [u64; 3],
    /// Set by the source once it has resolved the chunk against the volume extent
    pub bounds: Option<VoxelBounds>,
    pub data: Option<VolumeData>,
    pub state: ChunkState,
}

impl VolumeChunk {
    pub fn new(grid_position: [u64; 3]) -> Self {
        let [x, y, z] = grid_position;
        Self {
            key: ChunkKey::new(format!("{x},{y},{z}")),
            grid_position,
            bounds: None,
            data: None,
            state: ChunkState::Queued,
        }
    }

    pub fn system_memory_bytes(&self) -> usize {
        self.data
            .as_ref()
            .map(VolumeData::system_memory_bytes)
            .unwrap_or(0)
    }
}
