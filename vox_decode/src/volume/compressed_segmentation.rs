//! Neuroglancer compressed segmentation.
//!
//! The buffer is a sequence of little-endian `u32` words. Word `c` holds the offset of channel `c`;
//! every other offset is relative to that channel base. Each block starts with a two-word header:
//! the low 24 bits of the first word are the lookup table offset, the high 8 bits the encoded bit
//! width, and the second word is the offset of the packed value indices.

use super::{VolumeChunkLayout, VolumeData, VolumeEncoding, le_words};
use crate::{DataType, DecodeError};

const SUPPORTED_BITS: [u32; 7] = [0, 1, 2, 4, 8, 16, 32];

trait Element: Copy + Default {
    const WORDS: usize;
    fn from_words(words: &[u32]) -> Self;
}

impl Element for u32 {
    const WORDS: usize = 1;
    fn from_words(words: &[u32]) -> Self {
        words[0]
    }
}

impl Element for u64 {
    const WORDS: usize = 2;
    fn from_words(words: &[u32]) -> Self {
        words[0] as u64 | ((words[1] as u64) << 32)
    }
}

pub fn decode_compressed_segmentation(
    data: &[u8],
    layout: &VolumeChunkLayout,
) -> Result<VolumeData, DecodeError> {
    if data.len() % 4 != 0 {
        return Err(DecodeError::Misaligned {
            len: data.len(),
            width: 4,
        });
    }
    let words = le_words(data, u32::from_le_bytes);
    match layout.data_type {
        DataType::Uint32 => decode_channels::<u32>(&words, layout).map(VolumeData::Uint32),
        DataType::Uint64 => decode_channels::<u64>(&words, layout).map(VolumeData::Uint64),
        data_type => Err(DecodeError::UnsupportedDataType {
            encoding: VolumeEncoding::CompressedSegmentation,
            data_type,
        }),
    }
}

fn decode_channels<T: Element>(
    words: &[u32],
    layout: &VolumeChunkLayout,
) -> Result<Vec<T>, DecodeError> {
    let size = layout.chunk_data_size.map(|d| d as usize);
    let block = layout.compressed_segmentation_block_size.map(|d| d as usize);
    if block.contains(&0) {
        return Err(DecodeError::InvalidBlock {
            block: 0,
            reason: "zero block size",
        });
    }
    let voxels = layout.num_voxels();
    let channels = layout.num_channels as usize;
    let mut out = vec![T::default(); voxels * channels];
    for (channel, plane) in out.chunks_mut(voxels.max(1)).enumerate().take(channels) {
        let base = *words.get(channel).ok_or(DecodeError::Truncated {
            needed: (channel + 1) * 4,
            available: words.len() * 4,
        })? as usize;
        decode_channel(words, base, size, block, plane)?;
    }
    Ok(out)
}

fn decode_channel<T: Element>(
    words: &[u32],
    base: usize,
    size: [usize; 3],
    block: [usize; 3],
    out: &mut [T],
) -> Result<(), DecodeError> {
    let grid = [0, 1, 2].map(|i| size[i].div_ceil(block[i]));
    for gz in 0..grid[2] {
        for gy in 0..grid[1] {
            for gx in 0..grid[0] {
                let block_index = gx + grid[0] * (gy + grid[1] * gz);
                let header = base + 2 * block_index;
                let (Some(&h0), Some(&h1)) = (words.get(header), words.get(header + 1)) else {
                    return Err(DecodeError::InvalidBlock {
                        block: block_index,
                        reason: "header out of range",
                    });
                };
                let table_offset = (h0 & 0x00ff_ffff) as usize;
                let bits = h0 >> 24;
                let values_offset = h1 as usize;
                if !SUPPORTED_BITS.contains(&bits) {
                    return Err(DecodeError::InvalidBlock {
                        block: block_index,
                        reason: "unsupported bit width",
                    });
                }
                let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };

                let lo = [gx * block[0], gy * block[1], gz * block[2]];
                let hi = [0, 1, 2].map(|i| (lo[i] + block[i]).min(size[i]));
                for z in lo[2]..hi[2] {
                    for y in lo[1]..hi[1] {
                        for x in lo[0]..hi[0] {
                            let within = (x - lo[0]) + block[0] * ((y - lo[1]) + block[1] * (z - lo[2]));
                            let index = if bits == 0 {
                                0
                            } else {
                                let bit = within * bits as usize;
                                let word = words.get(base + values_offset + bit / 32).ok_or(
                                    DecodeError::InvalidBlock {
                                        block: block_index,
                                        reason: "encoded values out of range",
                                    },
                                )?;
                                ((word >> (bit % 32)) & mask) as usize
                            };
                            let entry = base + table_offset + index * T::WORDS;
                            let value = words.get(entry..entry + T::WORDS).ok_or(
                                DecodeError::InvalidBlock {
                                    block: block_index,
                                    reason: "lookup table index out of range",
                                },
                            )?;
                            out[x + size[0] * (y + size[1] * z)] = T::from_words(value);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn layout(size: [u32; 3], block: [u32; 3], channels: u32, data_type: DataType) -> VolumeChunkLayout {
        VolumeChunkLayout {
            chunk_data_size: size,
            num_channels: channels,
            data_type,
            compressed_segmentation_block_size: block,
        }
    }

    #[test]
    fn test_one_bit_block() {
        // header, one word of 1-bit indices [0, 1, 1, 0], table [7, 9]
        let words = [1, 3 | (1 << 24), 2, 0b0110, 7, 9];
        let decoded = decode_compressed_segmentation(
            &bytes(&words),
            &layout([2, 2, 1], [2, 2, 1], 1, DataType::Uint32),
        )
        .unwrap();
        assert_eq!(decoded, VolumeData::Uint32(vec![7, 9, 9, 7]));
    }

    #[test]
    fn test_uint64_table() {
        let words = [1, 3 | (1 << 24), 2, 0b0110, 7, 0, 9, 1];
        let decoded = decode_compressed_segmentation(
            &bytes(&words),
            &layout([2, 2, 1], [2, 2, 1], 1, DataType::Uint64),
        )
        .unwrap();
        let high = 9 | (1u64 << 32);
        assert_eq!(decoded, VolumeData::Uint64(vec![7, high, high, 7]));
    }

    #[test]
    fn test_partial_edge_block() {
        // two zero-bit blocks along x; the second covers a single voxel
        let words = [1, 4, 0, 5, 0, 5, 8];
        let decoded = decode_compressed_segmentation(
            &bytes(&words),
            &layout([3, 1, 1], [2, 1, 1], 1, DataType::Uint32),
        )
        .unwrap();
        assert_eq!(decoded, VolumeData::Uint32(vec![5, 5, 8]));
    }

    #[test]
    fn test_multiple_channels() {
        let words = [2, 5, 2, 0, 11, 2, 0, 22];
        let decoded = decode_compressed_segmentation(
            &bytes(&words),
            &layout([1, 1, 1], [1, 1, 1], 2, DataType::Uint32),
        )
        .unwrap();
        assert_eq!(decoded, VolumeData::Uint32(vec![11, 22]));
    }

    #[test]
    fn test_bad_bit_width() {
        let words = [1, 3 | (3 << 24), 2, 0, 7];
        assert!(matches!(
            decode_compressed_segmentation(
                &bytes(&words),
                &layout([1, 1, 1], [1, 1, 1], 1, DataType::Uint32)
            ),
            Err(DecodeError::InvalidBlock { block: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_uint8() {
        assert!(matches!(
            decode_compressed_segmentation(&[], &layout([1, 1, 1], [1, 1, 1], 1, DataType::Uint8)),
            Err(DecodeError::UnsupportedDataType { .. })
        ));
    }

    #[test]
    fn test_misaligned() {
        assert!(matches!(
            decode_compressed_segmentation(&[0; 5], &layout([1, 1, 1], [1, 1, 1], 1, DataType::Uint32)),
            Err(DecodeError::Misaligned { len: 5, width: 4 })
        ));
    }
}
