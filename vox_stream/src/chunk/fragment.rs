use super::{ChunkKey, ChunkState};

/// Decoded mesh geometry. Moves out of the coordinator as a unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FragmentPayload {
    pub vertex_positions: Vec<f32>,
    pub indices: Vec<u32>,
    pub vertex_normals: Vec<f32>,
}

impl FragmentPayload {
    pub fn system_memory_bytes(&self) -> usize {
        (self.vertex_positions.len() + self.vertex_normals.len()) * size_of::<f32>()
            + self.indices.len() * size_of::<u32>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentChunk {
    pub key: ChunkKey,
    pub manifest_key: ChunkKey,
    pub fragment_id: String,
    pub payload: Option<FragmentPayload>,
    pub state: ChunkState,
}

impl FragmentChunk {
    pub fn new(manifest_key: ChunkKey, fragment_id: String) -> Self {
        Self {
            key: ChunkKey::fragment(&manifest_key, &fragment_id),
            manifest_key,
            fragment_id,
            payload: None,
            state: ChunkState::Queued,
        }
    }

    pub fn system_memory_bytes(&self) -> usize {
        self.payload
            .as_ref()
            .map(FragmentPayload::system_memory_bytes)
            .unwrap_or(0)
    }
}
