//! Visibility-driven chunk streaming for segmentation layers.
//!
//! The [`orchestrator::MeshOrchestrator`] owns the chunk tables and runs priority passes; downloads
//! and graph calls run as tokio tasks and report back over a channel. Display state (root set,
//! visible set, equivalences) is shared with the selection layer through [`segments::DisplaySegments`].

pub mod bounds;
pub mod chunk;
pub mod config;
pub mod debounce;
mod error;
pub mod fetch;
pub mod graph;
pub mod orchestrator;
pub mod queue;
pub mod segments;
pub mod selection;
pub mod source;
#[cfg(test)]
pub(crate) mod testing;

pub use error::StreamError;

pub mod prelude {
    pub use crate::bounds::VoxelBounds;
    pub use crate::chunk::*;
    pub use crate::config::*;
    pub use crate::error::StreamError;
    pub use crate::fetch::{Fetch, FetchRequest, HttpFetcher};
    pub use crate::graph::{ChunkedGraph, ChunkedGraphClient, SegmentSelection};
    pub use crate::orchestrator::{ChildrenDisposition, MeshOrchestrator};
    pub use crate::queue::RequestQueue;
    pub use crate::segments::DisplaySegments;
    pub use crate::selection::SegmentationActions;
    pub use crate::source::*;
    pub use vox_containers::prelude::*;
}
