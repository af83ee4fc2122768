use super::ChunkSource;
use crate::StreamError;
use crate::chunk::SkeletonChunk;
use crate::config::SkeletonSourceConfig;
use crate::fetch::{Fetch, FetchRequest};
use derivative::Derivative;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vox_decode::decode_skeleton;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct SkeletonSource {
    config: SkeletonSourceConfig,
    #[derivative(Debug = "ignore")]
    fetch: Arc<dyn Fetch>,
}

impl SkeletonSource {
    pub fn new(config: SkeletonSourceConfig, fetch: Arc<dyn Fetch>) -> Self {
        Self { config, fetch }
    }
}

impl ChunkSource<SkeletonChunk> for SkeletonSource {
    fn download<'a>(
        &'a self,
        chunk: &'a mut SkeletonChunk,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<(), StreamError>> {
        async move {
            let url = format!("{}/{}", self.config.url.trim_end_matches('/'), chunk.object_id);
            let bytes = self.fetch.fetch(FetchRequest::Get(url), token).await?;
            chunk.geometry = Some(decode_skeleton(&bytes, &self.config.vertex_attributes)?);
            Ok(())
        }
        .boxed()
    }
}
