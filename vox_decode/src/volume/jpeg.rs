use super::{VolumeChunkLayout, VolumeData, VolumeEncoding};
use crate::{DataType, DecodeError};

/// JPEG-coded `uint8` voxels. Single-channel images are read as luma; three-channel images are
/// read as RGB and split into channel-major planes.
pub fn decode_jpeg(data: &[u8], layout: &VolumeChunkLayout) -> Result<VolumeData, DecodeError> {
    if layout.data_type != DataType::Uint8 {
        return Err(DecodeError::UnsupportedDataType {
            encoding: VolumeEncoding::Jpeg,
            data_type: layout.data_type,
        });
    }
    let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?;
    let voxels = match layout.num_channels {
        1 => image.to_luma8().into_raw(),
        3 => {
            let interleaved = image.to_rgb8().into_raw();
            let plane = interleaved.len() / 3;
            let mut planar = vec![0u8; interleaved.len()];
            for (i, pixel) in interleaved.chunks_exact(3).enumerate() {
                for (channel, value) in pixel.iter().enumerate() {
                    planar[channel * plane + i] = *value;
                }
            }
            planar
        }
        other => return Err(DecodeError::ChannelCount(other)),
    };
    if voxels.len() != layout.num_elements() {
        return Err(DecodeError::SizeMismatch {
            expected: layout.num_elements(),
            actual: voxels.len(),
        });
    }
    Ok(VolumeData::Uint8(voxels))
}
