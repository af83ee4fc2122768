use crate::format::DataType;
use crate::volume::VolumeEncoding;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Buffer too short: needed {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },
    #[error("Index count {count} is not a multiple of {vertices_per_primitive}")]
    IndexCount {
        count: usize,
        vertices_per_primitive: usize,
    },
    #[error("Buffer length {len} is not a multiple of {width}")]
    Misaligned { len: usize, width: usize },
    #[error("Expected {expected} bytes of voxel data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("Encoding {encoding:?} does not support data type {data_type:?}")]
    UnsupportedDataType {
        encoding: VolumeEncoding,
        data_type: DataType,
    },
    #[error("Unsupported channel count {0}")]
    ChannelCount(u32),
    #[error("Invalid compressed segmentation block {block}: {reason}")]
    InvalidBlock { block: usize, reason: &'static str },
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
