//! Chunk records, their lifecycle state and the priority model.

mod fragment;
mod graph_leaves;
mod manifest;
mod skeleton;
mod volume;

pub use fragment::*;
pub use graph_leaves::*;
pub use manifest::*;
pub use skeleton::*;
pub use volume::*;

use crate::bounds::VoxelBounds;
use std::fmt;
use vox_containers::prelude::SegmentId;

/// Manifests always outrank their own fragments
pub const MANIFEST_PRIORITY_OFFSET: f64 = 100.0;
pub const FRAGMENT_PRIORITY_OFFSET: f64 = 50.0;

/// Unique within a source. Manifests are `{object}` or `{object}/{bounds}`, fragments
/// `{manifest}/{fragment}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(String);

impl ChunkKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    pub fn manifest(object_id: SegmentId, clip_bounds: Option<&VoxelBounds>) -> Self {
        match clip_bounds {
            None => Self(object_id.to_string()),
            Some(bounds) => Self(format!("{object_id}/{bounds}")),
        }
    }

    pub fn fragment(manifest: &ChunkKey, fragment_id: &str) -> Self {
        Self(format!("{}/{}", manifest.0, fragment_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChunkKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum ChunkState {
    #[default]
    Queued,
    Downloading,
    /// Decoded and held by the worker context
    SystemMemoryWorker,
    SystemMemory,
    GpuMemory,
    Failed,
    /// Failed manifest with a graph children query in flight
    RequestingChildren,
}

impl ChunkState {
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            ChunkState::SystemMemoryWorker | ChunkState::SystemMemory | ChunkState::GpuMemory
        )
    }
}

/// Coarse request bucket; lower tiers are fetched first
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityTier {
    Visible,
    Prefetch,
    /// Known but not requested in the latest pass. Never dispatched.
    Recent,
}

impl PriorityTier {
    pub fn from_visibility(visibility: f64) -> Self {
        if visibility == f64::INFINITY {
            PriorityTier::Visible
        } else {
            PriorityTier::Prefetch
        }
    }

    pub fn base_priority(visibility: f64) -> f64 {
        if visibility == f64::INFINITY {
            0.0
        } else {
            visibility
        }
    }
}

/// State access shared by every chunk record
pub trait StreamChunk: Send + 'static {
    fn key(&self) -> &ChunkKey;
    fn state(&self) -> ChunkState;
    fn set_state(&mut self, state: ChunkState);
}

macro_rules! impl_stream_chunk {
    ($($chunk:ty),*) => {
        $(impl StreamChunk for $chunk {
            fn key(&self) -> &ChunkKey {
                &self.key
            }
            fn state(&self) -> ChunkState {
                self.state
            }
            fn set_state(&mut self, state: ChunkState) {
                self.state = state;
            }
        })*
    };
}

impl_stream_chunk!(
    ManifestChunk,
    FragmentChunk,
    VolumeChunk,
    SkeletonChunk,
    GraphLeavesChunk
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        let plain = ChunkKey::manifest(SegmentId::new(5), None);
        assert_eq!(plain.as_str(), "5");
        let bounds = VoxelBounds::new([0, 0, 0], [8, 8, 8]);
        let clipped = ChunkKey::manifest(SegmentId::new(5), Some(&bounds));
        assert_eq!(clipped.as_str(), "5/0-8_0-8_0-8");
        assert_ne!(
            ChunkKey::fragment(&plain, "1:0:0-64"),
            ChunkKey::fragment(&clipped, "1:0:0-64")
        );
    }

    #[test]
    fn test_priority_model() {
        assert_eq!(PriorityTier::from_visibility(f64::INFINITY), PriorityTier::Visible);
        assert_eq!(PriorityTier::base_priority(f64::INFINITY), 0.0);
        assert_eq!(PriorityTier::from_visibility(0.25), PriorityTier::Prefetch);
        assert_eq!(PriorityTier::base_priority(0.25), 0.25);
        assert!(PriorityTier::Visible < PriorityTier::Prefetch);
        assert!(PriorityTier::Prefetch < PriorityTier::Recent);
        assert!(MANIFEST_PRIORITY_OFFSET > FRAGMENT_PRIORITY_OFFSET);
    }

    #[test]
    fn test_loaded_states() {
        assert!(ChunkState::SystemMemoryWorker.is_loaded());
        assert!(ChunkState::GpuMemory.is_loaded());
        assert!(!ChunkState::Failed.is_loaded());
        assert!(!ChunkState::RequestingChildren.is_loaded());
    }
}
