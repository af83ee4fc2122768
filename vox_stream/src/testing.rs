//! Test doubles for the transport and graph seams.

use crate::StreamError;
use crate::fetch::{Fetch, FetchRequest};
use crate::graph::{ChunkedGraph, SegmentSelection};
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use vox_containers::prelude::{RootId, SegmentId};

/// Canned url -> body table. Unknown urls answer 404; held urls never answer until cancelled.
#[derive(Debug, Default)]
pub struct MockFetch {
    responses: Mutex<HashMap<String, Bytes>>,
    held: Mutex<HashSet<String>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl MockFetch {
    pub fn respond<B: Into<Bytes>>(&self, url: &str, body: B) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), body.into());
    }

    pub fn hold(&self, url: &str) {
        self.held.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url() == url)
            .count()
    }
}

impl Fetch for MockFetch {
    fn fetch(
        &self,
        request: FetchRequest,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<Bytes, StreamError>> {
        let url = request.url().to_string();
        self.calls.lock().unwrap().push(request);
        if self.held.lock().unwrap().contains(&url) {
            return async move {
                token.cancelled().await;
                Err(StreamError::Cancelled)
            }
            .boxed();
        }
        let response = self.responses.lock().unwrap().get(&url).cloned();
        async move {
            if token.is_cancelled() {
                return Err(StreamError::Cancelled);
            }
            response.ok_or(StreamError::Status { url, status: 404 })
        }
        .boxed()
    }
}

/// Graph double serving canned roots, edits and children. Segments without a canned root are
/// their own root. With a gate, each children response waits for one permit.
#[derive(Debug)]
pub struct MockGraph {
    configured: bool,
    roots: Mutex<HashMap<SegmentId, RootId>>,
    merged: Mutex<Option<RootId>>,
    split: Mutex<Option<Vec<RootId>>>,
    children: Mutex<HashMap<SegmentId, Vec<SegmentId>>>,
    children_calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl MockGraph {
    pub fn new() -> Self {
        Self {
            configured: true,
            roots: Mutex::default(),
            merged: Mutex::default(),
            split: Mutex::default(),
            children: Mutex::default(),
            children_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn gated(self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: Some(gate.clone()),
                ..self
            },
            gate,
        )
    }

    pub fn with_root(self, segment: u64, root: u64) -> Self {
        self.roots
            .lock()
            .unwrap()
            .insert(SegmentId::new(segment), RootId::new(root));
        self
    }

    pub fn with_merge(self, root: u64) -> Self {
        *self.merged.lock().unwrap() = Some(RootId::new(root));
        self
    }

    pub fn with_split(self, roots: &[u64]) -> Self {
        *self.split.lock().unwrap() = Some(roots.iter().copied().map(RootId::new).collect());
        self
    }

    pub fn with_children(self, segment: u64, children: &[u64]) -> Self {
        self.children.lock().unwrap().insert(
            SegmentId::new(segment),
            children.iter().copied().map(SegmentId::new).collect(),
        );
        self
    }

    pub fn children_calls(&self) -> usize {
        self.children_calls.load(Ordering::SeqCst)
    }
}

impl ChunkedGraph for MockGraph {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn get_root(&self, selection: SegmentSelection) -> BoxFuture<'static, Result<RootId, StreamError>> {
        let root = self
            .roots
            .lock()
            .unwrap()
            .get(&selection.segment)
            .copied()
            .unwrap_or(selection.segment);
        futures::future::ready(Ok(root)).boxed()
    }

    fn merge_segments(
        &self,
        _first: SegmentSelection,
        _second: SegmentSelection,
    ) -> BoxFuture<'static, Result<RootId, StreamError>> {
        let merged = *self.merged.lock().unwrap();
        futures::future::ready(merged.ok_or(StreamError::Configuration("mock graph"))).boxed()
    }

    fn split_segments(
        &self,
        _sources: Vec<SegmentSelection>,
        _sinks: Vec<SegmentSelection>,
    ) -> BoxFuture<'static, Result<Vec<RootId>, StreamError>> {
        let split = self.split.lock().unwrap().clone();
        futures::future::ready(split.ok_or(StreamError::Configuration("mock graph"))).boxed()
    }

    fn get_children(&self, segment: SegmentId) -> BoxFuture<'static, Result<Vec<SegmentId>, StreamError>> {
        self.children_calls.fetch_add(1, Ordering::SeqCst);
        let children = self.children.lock().unwrap().get(&segment).cloned();
        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.acquire()
                    .await
                    .map_err(|_| StreamError::Cancelled)?
                    .forget();
            }
            children.ok_or(StreamError::Protocol(format!("No children for {segment}")))
        }
        .boxed()
    }
}

/// Encoded mesh fragment: one right triangle in the z = 0 plane
pub fn triangle_fragment() -> Vec<u8> {
    let mut data = 3u32.to_le_bytes().to_vec();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    for i in [0u32, 1, 2] {
        data.extend_from_slice(&i.to_le_bytes());
    }
    data
}
