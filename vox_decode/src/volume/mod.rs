//! Volume chunk decoders.
//!
//! The encoding set is closed, so dispatch is a plain match. A source picks its decoder once at
//! construction with [`VolumeEncoding::decoder`].

mod compressed_segmentation;
mod jpeg;
mod raw;

use crate::{DataType, DecodeError};

pub use compressed_segmentation::decode_compressed_segmentation;
pub use jpeg::decode_jpeg;
pub use raw::decode_raw;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeEncoding {
    Raw,
    Jpeg,
    CompressedSegmentation,
}

/// Decoder entry point shared by every encoding
pub type VolumeDecoder = fn(&[u8], &VolumeChunkLayout) -> Result<VolumeData, DecodeError>;

impl VolumeEncoding {
    pub fn decoder(self) -> VolumeDecoder {
        match self {
            VolumeEncoding::Raw => decode_raw,
            VolumeEncoding::Jpeg => decode_jpeg,
            VolumeEncoding::CompressedSegmentation => decode_compressed_segmentation,
        }
    }
}

/// Shape of the voxel block carried by one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeChunkLayout {
    /// Actual size of this chunk in voxels; edge chunks may be smaller than the nominal size
    pub chunk_data_size: [u32; 3],
    pub num_channels: u32,
    pub data_type: DataType,
    pub compressed_segmentation_block_size: [u32; 3],
}

impl VolumeChunkLayout {
    pub fn num_voxels(&self) -> usize {
        self.chunk_data_size.iter().map(|&d| d as usize).product()
    }

    pub fn num_elements(&self) -> usize {
        self.num_voxels() * self.num_channels as usize
    }
}

/// Decoded voxels in channel-major, x-fastest order
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Float32(Vec<f32>),
}

impl VolumeData {
    pub fn len(&self) -> usize {
        match self {
            VolumeData::Uint8(v) => v.len(),
            VolumeData::Uint16(v) => v.len(),
            VolumeData::Uint32(v) => v.len(),
            VolumeData::Uint64(v) => v.len(),
            VolumeData::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            VolumeData::Uint8(_) => DataType::Uint8,
            VolumeData::Uint16(_) => DataType::Uint16,
            VolumeData::Uint32(_) => DataType::Uint32,
            VolumeData::Uint64(_) => DataType::Uint64,
            VolumeData::Float32(_) => DataType::Float32,
        }
    }

    pub fn system_memory_bytes(&self) -> usize {
        self.len() * self.data_type().size_in_bytes()
    }
}

/// Little-endian words to native values
pub(crate) fn le_words<const N: usize, T>(data: &[u8], convert: fn([u8; N]) -> T) -> Vec<T> {
    data.chunks_exact(N)
        .map(|word| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(word);
            convert(bytes)
        })
        .collect()
}
