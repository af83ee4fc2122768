use super::ChunkSource;
use crate::StreamError;
use crate::bounds::VoxelBounds;
use crate::chunk::GraphLeavesChunk;
use crate::config::{GraphConfig, VolumeSourceConfig};
use crate::fetch::{Fetch, FetchRequest};
use derivative::Derivative;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vox_containers::prelude::{SegmentSet, Uint64};

/// Resolves, per spatial chunk, which supervoxels belong to each selected root
#[derive(Derivative)]
#[derivative(Debug)]
pub struct GraphLeavesSource {
    url: String,
    chunk_size: [u32; 3],
    voxel_offset: [i64; 3],
    volume_size: [u64; 3],
    root_segments: Arc<SegmentSet>,
    #[derivative(Debug = "ignore")]
    fetch: Arc<dyn Fetch>,
}

impl GraphLeavesSource {
    pub fn new(
        graph: &GraphConfig,
        volume: &VolumeSourceConfig,
        root_segments: Arc<SegmentSet>,
        fetch: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            url: graph.url.trim_end_matches('/').to_string(),
            chunk_size: volume.chunk_size,
            voxel_offset: volume.voxel_offset,
            volume_size: volume.volume_size,
            root_segments,
            fetch,
        }
    }
}

impl ChunkSource<GraphLeavesChunk> for GraphLeavesSource {
    fn download<'a>(
        &'a self,
        chunk: &'a mut GraphLeavesChunk,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        async move {
            let bounds = VoxelBounds::for_chunk(
                chunk.grid_position,
                self.chunk_size,
                self.voxel_offset,
                self.volume_size,
            );
            let missing = chunk.missing_roots(&self.root_segments.to_vec());
            let requests = missing.into_iter().map(|root| {
                let url = format!("{}/1.0/segment/{root}/leaves?bounds={bounds}", self.url);
                let response = self.fetch.fetch(FetchRequest::Get(url), token.clone());
                async move {
                    let leaves = response
                        .await
                        .and_then(|bytes| Ok(Uint64::decode_packed(&bytes)?));
                    (root, leaves)
                }
            });
            let results = futures::future::join_all(requests).await;

            let total = results.len();
            let mut failed = 0;
            let mut first = None;
            for (root, leaves) in results {
                match leaves {
                    Ok(leaves) => {
                        chunk.mappings.insert(root, leaves);
                    }
                    Err(err) => {
                        tracing::warn!(key = %chunk.key, %root, ?err, "Leaves request failed");
                        failed += 1;
                        first.get_or_insert(err);
                    }
                }
            }
            match first {
                None => Ok(()),
                Some(_) if token.is_cancelled() => Err(StreamError::Cancelled),
                Some(first) => Err(StreamError::Aggregate {
                    failed,
                    total,
                    first: Box::new(first),
                }),
            }
        }
        .boxed()
    }
}
