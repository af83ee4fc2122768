//! Pure decoders for the binary chunk formats: mesh and skeleton geometry, vertex normals,
//! skeleton vertex attributes and volume blocks.
//!
//! Everything here is synchronous and stateless. Wire data is little-endian.

pub mod endian;
mod error;
mod format;
mod geometry;
mod normals;
mod skeleton;
pub mod volume;

pub use error::DecodeError;
pub use format::DataType;
pub use geometry::{
    RawGeometry, decode_triangle_vertex_positions_and_indices, decode_vertex_positions_and_indices,
};
pub use normals::compute_vertex_normals;
pub use skeleton::{SkeletonGeometry, VertexAttribute, VertexAttributeInfo, decode_skeleton};
pub use volume::{VolumeChunkLayout, VolumeData, VolumeDecoder, VolumeEncoding};
