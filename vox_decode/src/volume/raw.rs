use super::{VolumeChunkLayout, VolumeData, le_words};
use crate::{DataType, DecodeError};

/// Uncompressed little-endian voxels; the length must match the layout exactly
pub fn decode_raw(data: &[u8], layout: &VolumeChunkLayout) -> Result<VolumeData, DecodeError> {
    let expected = layout.num_elements() * layout.data_type.size_in_bytes();
    if data.len() != expected {
        return Err(DecodeError::SizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(match layout.data_type {
        DataType::Uint8 => VolumeData::Uint8(data.to_vec()),
        DataType::Uint16 => VolumeData::Uint16(le_words(data, u16::from_le_bytes)),
        DataType::Uint32 => VolumeData::Uint32(le_words(data, u32::from_le_bytes)),
        DataType::Uint64 => VolumeData::Uint64(le_words(data, u64::from_le_bytes)),
        DataType::Float32 => VolumeData::Float32(le_words(data, f32::from_le_bytes)),
    })
}
