use super::ChunkSource;
use crate::StreamError;
use crate::bounds::VoxelBounds;
use crate::chunk::{FragmentChunk, FragmentPayload, ManifestChunk};
use crate::config::MeshSourceConfig;
use crate::fetch::{Fetch, FetchRequest};
use derivative::Derivative;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vox_containers::prelude::SegmentId;
use vox_decode::{compute_vertex_normals, decode_triangle_vertex_positions_and_indices};

#[derive(Debug, serde::Deserialize)]
struct ManifestResponse {
    fragments: Vec<String>,
}

/// Serves both manifests (JSON fragment lists) and fragments (binary triangle meshes)
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MeshSource {
    config: MeshSourceConfig,
    #[derivative(Debug = "ignore")]
    fetch: Arc<dyn Fetch>,
}

impl MeshSource {
    pub fn new(config: MeshSourceConfig, fetch: Arc<dyn Fetch>) -> Self {
        Self { config, fetch }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    pub fn manifest_url(&self, object_id: SegmentId, clip_bounds: Option<&VoxelBounds>) -> String {
        let mut url = match self.config.lod {
            Some(lod) => format!("{}/{object_id}:{lod}", self.base_url()),
            None => format!("{}/{object_id}", self.base_url()),
        };
        if let Some(bounds) = clip_bounds {
            url.push_str(&format!("?bounds={bounds}"));
        }
        url
    }

    pub fn fragment_url(&self, fragment_id: &str) -> String {
        format!("{}/{fragment_id}", self.base_url())
    }
}

impl ChunkSource<ManifestChunk> for MeshSource {
    fn download<'a>(
        &'a self,
        chunk: &'a mut ManifestChunk,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        async move {
            let url = self.manifest_url(chunk.object_id, chunk.clip_bounds.as_ref());
            let bytes = self.fetch.fetch(FetchRequest::Get(url), token).await?;
            let manifest: ManifestResponse = serde_json::from_slice(&bytes)?;
            chunk.fragment_ids = Some(manifest.fragments);
            Ok(())
        }
        .boxed()
    }
}

impl ChunkSource<FragmentChunk> for MeshSource {
    fn download<'a>(
        &'a self,
        chunk: &'a mut FragmentChunk,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        async move {
            let url = self.fragment_url(&chunk.fragment_id);
            let bytes = self.fetch.fetch(FetchRequest::Get(url), token).await?;
            let geometry = decode_triangle_vertex_positions_and_indices(&bytes)?;
            let vertex_normals = compute_vertex_normals(&geometry.vertex_positions, &geometry.indices);
            chunk.payload = Some(FragmentPayload {
                vertex_positions: geometry.vertex_positions,
                indices: geometry.indices,
                vertex_normals,
            });
            Ok(())
        }
        .boxed()
    }
}
