pub use super::equivalences::{DisjointSets, SegmentEquivalences};
pub use super::error::ContainerErrors;
pub use super::id::{RootId, SegmentId, Uint64};
pub use super::segment_set::SegmentSet;
