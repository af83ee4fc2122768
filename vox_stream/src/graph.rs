//! Chunked graph protocol: root resolution, merge, split and children lookup.
//!
//! Responses are packed ids. Every failure is logged with the segment ids involved and then
//! returned; nothing here retries.

use crate::StreamError;
use crate::config::GraphConfig;
use crate::fetch::{Fetch, FetchRequest};
use derivative::Derivative;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vox_containers::prelude::{RootId, SegmentId, Uint64};

/// A segment together with the voxel position it was picked at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSelection {
    pub segment: SegmentId,
    pub position: [f64; 3],
}

impl SegmentSelection {
    pub fn new(segment: SegmentId, position: [f64; 3]) -> Self {
        Self { segment, position }
    }

    fn to_json(self) -> serde_json::Value {
        let [x, y, z] = self.position;
        json!([self.segment.to_string(), x, y, z])
    }
}

pub trait ChunkedGraph: Send + Sync + 'static {
    /// Whether a graph server backs this client
    fn is_configured(&self) -> bool;

    /// Without a graph server every segment is its own root
    fn get_root(&self, selection: SegmentSelection) -> BoxFuture<'static, Result<RootId, StreamError>>;

    fn merge_segments(
        &self,
        first: SegmentSelection,
        second: SegmentSelection,
    ) -> BoxFuture<'static, Result<RootId, StreamError>>;

    fn split_segments(
        &self,
        sources: Vec<SegmentSelection>,
        sinks: Vec<SegmentSelection>,
    ) -> BoxFuture<'static, Result<Vec<RootId>, StreamError>>;

    fn get_children(&self, segment: SegmentId) -> BoxFuture<'static, Result<Vec<SegmentId>, StreamError>>;
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ChunkedGraphClient {
    url: Option<String>,
    #[derivative(Debug = "ignore")]
    fetch: Arc<dyn Fetch>,
}

impl ChunkedGraphClient {
    pub fn new(config: Option<&GraphConfig>, fetch: Arc<dyn Fetch>) -> Self {
        Self {
            url: config.map(|c| c.url.trim_end_matches('/').to_string()),
            fetch,
        }
    }

    fn request_ids(&self, request: FetchRequest) -> BoxFuture<'static, Result<Vec<Uint64>, StreamError>> {
        let fetch = self.fetch.clone();
        async move {
            let bytes = fetch.fetch(request, CancellationToken::new()).await?;
            Ok(Uint64::decode_packed(&bytes)?)
        }
        .boxed()
    }
}

fn single_id(ids: Vec<Uint64>) -> Result<Uint64, StreamError> {
    match ids.as_slice() {
        [id] => Ok(*id),
        other => Err(StreamError::Protocol(format!(
            "Expected a single id, got {}",
            other.len()
        ))),
    }
}

fn not_configured<T: Send + 'static>(operation: &'static str) -> BoxFuture<'static, Result<T, StreamError>> {
    tracing::error!("{operation} requested without a graph server");
    futures::future::ready(Err(StreamError::Configuration("No graph server configured"))).boxed()
}

impl ChunkedGraph for ChunkedGraphClient {
    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    fn get_root(&self, selection: SegmentSelection) -> BoxFuture<'static, Result<RootId, StreamError>> {
        let Some(url) = &self.url else {
            return futures::future::ready(Ok(selection.segment)).boxed();
        };
        let ids = self.request_ids(FetchRequest::PostJson {
            url: format!("{url}/1.0/graph/root"),
            body: selection.to_json(),
        });
        async move {
            ids.await.and_then(single_id).inspect_err(|err| {
                tracing::error!(segment = %selection.segment, ?err, "Failed to resolve root");
            })
        }
        .boxed()
    }

    fn merge_segments(
        &self,
        first: SegmentSelection,
        second: SegmentSelection,
    ) -> BoxFuture<'static, Result<RootId, StreamError>> {
        let Some(url) = &self.url else {
            return not_configured("Merge");
        };
        let ids = self.request_ids(FetchRequest::PostJson {
            url: format!("{url}/1.0/graph/merge"),
            body: json!([first.to_json(), second.to_json()]),
        });
        async move {
            ids.await.and_then(single_id).inspect_err(|err| {
                tracing::error!(first = %first.segment, second = %second.segment, ?err, "Merge failed");
            })
        }
        .boxed()
    }

    fn split_segments(
        &self,
        sources: Vec<SegmentSelection>,
        sinks: Vec<SegmentSelection>,
    ) -> BoxFuture<'static, Result<Vec<RootId>, StreamError>> {
        let Some(url) = &self.url else {
            return not_configured("Split");
        };
        let body = json!({
            "sources": sources.iter().map(|s| s.to_json()).collect::<Vec<_>>(),
            "sinks": sinks.iter().map(|s| s.to_json()).collect::<Vec<_>>(),
        });
        let ids = self.request_ids(FetchRequest::PostJson {
            url: format!("{url}/1.0/graph/split"),
            body,
        });
        async move {
            ids.await.inspect_err(|err| {
                let sources: Vec<SegmentId> = sources.iter().map(|s| s.segment).collect();
                let sinks: Vec<SegmentId> = sinks.iter().map(|s| s.segment).collect();
                tracing::error!(?sources, ?sinks, ?err, "Split failed");
            })
        }
        .boxed()
    }

    fn get_children(&self, segment: SegmentId) -> BoxFuture<'static, Result<Vec<SegmentId>, StreamError>> {
        let Some(url) = &self.url else {
            return not_configured("Children lookup");
        };
        let ids = self.request_ids(FetchRequest::Get(format!(
            "{url}/1.0/segment/{segment}/children"
        )));
        async move {
            ids.await.inspect_err(|err| {
                tracing::error!(%segment, ?err, "Failed to get children");
            })
        }
        .boxed()
    }
}
