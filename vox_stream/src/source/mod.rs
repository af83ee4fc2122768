//! Chunk sources map a chunk record to its download. Each source takes its typed configuration
//! at construction and implements [`ChunkSource`] for the chunk kinds it serves.

mod graph_leaves;
mod mesh;
mod skeleton;
mod volume;

pub use graph_leaves::GraphLeavesSource;
pub use mesh::MeshSource;
pub use skeleton::SkeletonSource;
pub use volume::VolumeSource;

use crate::StreamError;
use crate::chunk::{ChunkState, StreamChunk};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

pub trait ChunkSource<C>: Send + Sync + 'static {
    /// Fills the chunk's payload fields. Does not touch the chunk state.
    fn download<'a>(
        &'a self,
        chunk: &'a mut C,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<(), StreamError>>;
}

/// Runs one download and records the outcome on the chunk.
///
/// Success leaves the chunk in [`ChunkState::SystemMemoryWorker`], a cancelled download returns
/// it to [`ChunkState::Queued`] and any other failure marks it [`ChunkState::Failed`]. Nothing is
/// retried.
pub async fn download_chunk<C, S>(
    source: &S,
    chunk: &mut C,
    token: CancellationToken,
) -> Result<(), StreamError>
where
    C: StreamChunk,
    S: ChunkSource<C> + ?Sized,
{
    chunk.set_state(ChunkState::Downloading);
    let result = source.download(chunk, token).await;
    match &result {
        Ok(()) => chunk.set_state(ChunkState::SystemMemoryWorker),
        Err(StreamError::Cancelled) => {
            tracing::trace!(key = %chunk.key(), "Download cancelled");
            chunk.set_state(ChunkState::Queued);
        }
        Err(err) => {
            tracing::warn!(key = %chunk.key(), ?err, "Download failed");
            chunk.set_state(ChunkState::Failed);
        }
    }
    result
}
