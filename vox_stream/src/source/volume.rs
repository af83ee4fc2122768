use super::ChunkSource;
use crate::StreamError;
use crate::bounds::VoxelBounds;
use crate::chunk::VolumeChunk;
use crate::config::VolumeSourceConfig;
use crate::fetch::{Fetch, FetchRequest};
use derivative::Derivative;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vox_decode::{VolumeChunkLayout, VolumeDecoder};

#[derive(Derivative)]
#[derivative(Debug)]
pub struct VolumeSource {
    config: VolumeSourceConfig,
    /// Picked once from the configured encoding
    decoder: VolumeDecoder,
    #[derivative(Debug = "ignore")]
    fetch: Arc<dyn Fetch>,
}

impl VolumeSource {
    pub fn new(config: VolumeSourceConfig, fetch: Arc<dyn Fetch>) -> Self {
        Self {
            decoder: config.encoding.decoder(),
            config,
            fetch,
        }
    }

    pub fn chunk_bounds(&self, grid_position: [u64; 3]) -> VoxelBounds {
        VoxelBounds::for_chunk(
            grid_position,
            self.config.chunk_size,
            self.config.voxel_offset,
            self.config.volume_size,
        )
    }

    pub fn chunk_url(&self, bounds: &VoxelBounds) -> String {
        format!(
            "{}/{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.path,
            bounds
        )
    }
}

impl ChunkSource<VolumeChunk> for VolumeSource {
    fn download<'a>(
        &'a self,
        chunk: &'a mut VolumeChunk,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        async move {
            let bounds = self.chunk_bounds(chunk.grid_position);
            if bounds.is_empty() {
                return Err(StreamError::Protocol(format!(
                    "Chunk {} lies outside the volume",
                    chunk.key
                )));
            }
            let bytes = self
                .fetch
                .fetch(FetchRequest::Get(self.chunk_url(&bounds)), token)
                .await?;
            let layout = VolumeChunkLayout {
                chunk_data_size: bounds.size(),
                num_channels: self.config.num_channels,
                data_type: self.config.data_type,
                compressed_segmentation_block_size: self.config.compressed_segmentation_block_size,
            };
            chunk.data = Some((self.decoder)(&bytes, &layout)?);
            chunk.bounds = Some(bounds);
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkState;
    use crate::source::download_chunk;
    use crate::testing::MockFetch;
    use vox_decode::{DataType, VolumeData, VolumeEncoding};

    fn config() -> VolumeSourceConfig {
        VolumeSourceConfig {
            url: "http://volume/".to_string(),
            path: "4_4_40".to_string(),
            encoding: VolumeEncoding::Raw,
            data_type: DataType::Uint16,
            num_channels: 1,
            chunk_size: [2, 2, 2],
            voxel_offset: [0, 0, 0],
            volume_size: [3, 2, 2],
            compressed_segmentation_block_size: [8, 8, 8],
        }
    }

    #[tokio::test]
    async fn test_edge_chunk_download() {
        let fetch = Arc::new(MockFetch::default());
        let values: Vec<u8> = (0u16..4).flat_map(|v| v.to_le_bytes()).collect();
        fetch.respond("http://volume/4_4_40/2-3_0-2_0-2", values);
        let source = VolumeSource::new(config(), fetch.clone());

        let mut chunk = VolumeChunk::new([1, 0, 0]);
        download_chunk(&source, &mut chunk, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(chunk.state, ChunkState::SystemMemoryWorker);
        assert_eq!(chunk.data, Some(VolumeData::Uint16(vec![0, 1, 2, 3])));
        assert_eq!(chunk.bounds.unwrap().size(), [1, 2, 2]);
        assert_eq!(chunk.system_memory_bytes(), 8);
    }

    #[tokio::test]
    async fn test_decode_error_fails_chunk() {
        let fetch = Arc::new(MockFetch::default());
        fetch.respond("http://volume/4_4_40/0-2_0-2_0-2", vec![0u8; 3]);
        let source = VolumeSource::new(config(), fetch);

        let mut chunk = VolumeChunk::new([0, 0, 0]);
        let result = download_chunk(&source, &mut chunk, CancellationToken::new()).await;
        assert!(matches!(result, Err(StreamError::Decode(_))));
        assert_eq!(chunk.state, ChunkState::Failed);
        assert!(chunk.data.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_returns_to_queued() {
        let fetch = Arc::new(MockFetch::default());
        fetch.hold("http://volume/4_4_40/0-2_0-2_0-2");
        let source = VolumeSource::new(config(), fetch);
        let token = CancellationToken::new();
        token.cancel();

        let mut chunk = VolumeChunk::new([0, 0, 0]);
        let result = download_chunk(&source, &mut chunk, token).await;
        assert!(matches!(result, Err(StreamError::Cancelled)));
        assert_eq!(chunk.state, ChunkState::Queued);
    }
}
