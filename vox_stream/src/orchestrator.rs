//! Mesh orchestrator.
//!
//! The coordinator side of mesh streaming. Each pass ([`MeshOrchestrator::update_priorities`])
//! requests the manifest of every visible segment and the fragments of every loaded manifest.
//! [`MeshOrchestrator::dispatch`] starts downloads on the runtime; finished downloads and graph
//! responses come back as [`ChunkEvent`]s and are applied by [`MeshOrchestrator::process_queue`].
//!
//! A manifest that fails to download while a graph server is configured falls back to asking
//! the graph for the children of its segment. Responses are accumulated per root and applied to
//! the display state in one debounced flush. Root membership is checked both when a response
//! arrives and again when the batch is applied.

use crate::StreamError;
use crate::bounds::VoxelBounds;
use crate::chunk::{
    ChunkKey, ChunkState, FRAGMENT_PRIORITY_OFFSET, FragmentChunk, FragmentPayload,
    MANIFEST_PRIORITY_OFFSET, ManifestChunk, PriorityTier, StreamChunk,
};
use crate::config::SchedulerConfig;
use crate::debounce::Debouncer;
use crate::graph::ChunkedGraph;
use crate::queue::RequestQueue;
use crate::segments::DisplaySegments;
use crate::source::{ChunkSource, MeshSource, download_chunk};
use derivative::Derivative;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use vox_containers::prelude::{RootId, SegmentId};

/// Result of a worker task, posted back to the coordinator
#[derive(Debug)]
pub enum ChunkEvent {
    Manifest {
        generation: u64,
        chunk: ManifestChunk,
        result: Result<(), StreamError>,
    },
    Fragment {
        generation: u64,
        chunk: FragmentChunk,
        result: Result<(), StreamError>,
    },
    Children {
        key: ChunkKey,
        segment: SegmentId,
        root: RootId,
        result: Result<Vec<SegmentId>, StreamError>,
    },
}

/// Pending membership change for one root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildChunkUpdate {
    pub add: Vec<SegmentId>,
    pub delete: Vec<SegmentId>,
}

pub type PendingChildUpdates = Arc<Mutex<BTreeMap<RootId, ChildChunkUpdate>>>;

/// What happened to a children response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenDisposition {
    /// Added to the pending batch
    Accumulated { root: RootId, children: usize },
    /// The root was deselected while the request was in flight
    Invalidated { root: RootId },
    /// The graph call failed; the manifest stays failed
    Failed { segment: SegmentId },
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug)]
struct Tracked<C> {
    chunk: C,
    in_flight: Option<InFlight>,
}

impl<C: StreamChunk> Tracked<C> {
    fn new(chunk: C) -> Self {
        Self {
            chunk,
            in_flight: None,
        }
    }

    /// Cancels an in-flight download and puts the chunk back in the queue
    fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.token.cancel();
            self.chunk.set_state(ChunkState::Queued);
        }
    }

    /// Accepts a worker result unless it belongs to a cancelled or superseded download
    fn accept(&mut self, generation: u64, chunk: C) -> bool {
        match &self.in_flight {
            Some(in_flight) if in_flight.generation == generation => {
                self.in_flight = None;
                self.chunk = chunk;
                true
            }
            _ => false,
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct MeshOrchestrator {
    source: Arc<MeshSource>,
    #[derivative(Debug = "ignore")]
    graph: Arc<dyn ChunkedGraph>,
    segments: DisplaySegments,
    config: SchedulerConfig,
    runtime: Handle,
    clip_bounds: Option<VoxelBounds>,

    manifests: HashMap<ChunkKey, Tracked<ManifestChunk>>,
    fragments: HashMap<ChunkKey, Tracked<FragmentChunk>>,
    queue: RequestQueue,
    next_generation: u64,

    pending: PendingChildUpdates,
    debouncer: Debouncer,

    event_send: crossbeam_channel::Sender<ChunkEvent>,
    event_recv: crossbeam_channel::Receiver<ChunkEvent>,
}

impl MeshOrchestrator {
    pub fn new(
        source: Arc<MeshSource>,
        graph: Arc<dyn ChunkedGraph>,
        segments: DisplaySegments,
        config: SchedulerConfig,
        runtime: Handle,
    ) -> Self {
        let (event_send, event_recv) = crossbeam_channel::unbounded();
        Self {
            source,
            graph,
            segments,
            debouncer: Debouncer::new(config.debounce_delay(), runtime.clone()),
            config,
            runtime,
            clip_bounds: None,
            manifests: HashMap::new(),
            fragments: HashMap::new(),
            queue: RequestQueue::new(),
            next_generation: 0,
            pending: Arc::default(),
            event_send,
            event_recv,
        }
    }

    pub fn segments(&self) -> &DisplaySegments {
        &self.segments
    }

    /// Manifests requested from now on carry these bounds
    pub fn set_clip_bounds(&mut self, clip_bounds: Option<VoxelBounds>) {
        self.clip_bounds = clip_bounds;
    }

    /// One full step: apply finished work, recompute priorities, start downloads
    pub fn tick(&mut self, visibility: f64) -> Vec<ChildrenDisposition> {
        let dispositions = self.process_queue();
        self.update_priorities(visibility);
        self.dispatch();
        dispositions
    }

    /// Rebuilds the request queue from the visible segment set.
    pub fn update_priorities(&mut self, visibility: f64) {
        self.queue.clear();
        let tier = PriorityTier::from_visibility(visibility);
        let base_priority = PriorityTier::base_priority(visibility);

        for object_id in self.segments.visible_segments_3d.to_vec() {
            let root = self.segments.root_of(object_id);
            let key = ChunkKey::manifest(object_id, self.clip_bounds.as_ref());
            let clip_bounds = self.clip_bounds;
            let manifest = &self
                .manifests
                .entry(key.clone())
                .or_insert_with(|| Tracked::new(ManifestChunk::new(object_id, clip_bounds)))
                .chunk;
            let state = manifest.state;
            let fragment_keys = manifest.fragment_keys();
            let fragment_ids = manifest.fragment_ids.clone().unwrap_or_default();

            self.queue
                .request(key.clone(), tier, base_priority + MANIFEST_PRIORITY_OFFSET);
            match state {
                state if state.is_loaded() => {
                    for (fragment_key, fragment_id) in fragment_keys.into_iter().zip(fragment_ids) {
                        self.fragments.entry(fragment_key.clone()).or_insert_with(|| {
                            Tracked::new(FragmentChunk::new(key.clone(), fragment_id))
                        });
                        self.queue
                            .request(fragment_key, tier, base_priority + FRAGMENT_PRIORITY_OFFSET);
                    }
                }
                ChunkState::Failed => self.request_children(&key, object_id, root),
                _ => {}
            }
        }
    }

    /// Cancels downloads the latest pass no longer wants, then starts queued chunks in priority
    /// order up to the concurrency limit. Returns the number of downloads started.
    pub fn dispatch(&mut self) -> usize {
        for tracked in self.manifests.values_mut() {
            if tracked.in_flight.is_some() && !self.queue.contains(tracked.chunk.key()) {
                tracing::trace!(key = %tracked.chunk.key, "Cancelling manifest download");
                tracked.cancel();
            }
        }
        for tracked in self.fragments.values_mut() {
            if tracked.in_flight.is_some() && !self.queue.contains(tracked.chunk.key()) {
                tracing::trace!(key = %tracked.chunk.key, "Cancelling fragment download");
                tracked.cancel();
            }
        }

        let mut in_flight = self.in_flight_count();
        let mut started = 0;
        for request in self.queue.ordered() {
            if in_flight >= self.config.max_concurrent_downloads {
                break;
            }
            if request.tier == PriorityTier::Recent {
                continue;
            }
            let generation = self.next_generation;
            let launched = if let Some(tracked) = self.manifests.get_mut(&request.key) {
                start_download(
                    tracked,
                    generation,
                    &self.runtime,
                    &self.source,
                    &self.event_send,
                    |generation, chunk, result| ChunkEvent::Manifest {
                        generation,
                        chunk,
                        result,
                    },
                )
            } else if let Some(tracked) = self.fragments.get_mut(&request.key) {
                start_download(
                    tracked,
                    generation,
                    &self.runtime,
                    &self.source,
                    &self.event_send,
                    |generation, chunk, result| ChunkEvent::Fragment {
                        generation,
                        chunk,
                        result,
                    },
                )
            } else {
                false
            };
            if launched {
                self.next_generation += 1;
                in_flight += 1;
                started += 1;
            }
        }
        started
    }

    /// Drains the worker channel and applies every event
    pub fn process_queue(&mut self) -> Vec<ChildrenDisposition> {
        let mut dispositions = Vec::new();
        while let Ok(event) = self.event_recv.try_recv() {
            match event {
                ChunkEvent::Manifest {
                    generation,
                    mut chunk,
                    result,
                } => {
                    let Some(tracked) = self.manifests.get_mut(&chunk.key) else {
                        continue;
                    };
                    if result.is_ok() {
                        chunk.state = ChunkState::SystemMemory;
                    }
                    if !tracked.accept(generation, chunk) {
                        tracing::trace!(key = %tracked.chunk.key, "Ignoring stale manifest result");
                    }
                }
                ChunkEvent::Fragment {
                    generation, chunk, ..
                } => {
                    let Some(tracked) = self.fragments.get_mut(&chunk.key) else {
                        continue;
                    };
                    if !tracked.accept(generation, chunk) {
                        tracing::trace!(key = %tracked.chunk.key, "Ignoring stale fragment result");
                    }
                }
                ChunkEvent::Children {
                    key,
                    segment,
                    root,
                    result,
                } => dispositions.push(self.handle_children_response(&key, segment, root, result)),
            }
        }
        dispositions
    }

    /// Applies a graph children response for the manifest at `key`.
    pub fn handle_children_response(
        &mut self,
        key: &ChunkKey,
        segment: SegmentId,
        root: RootId,
        result: Result<Vec<SegmentId>, StreamError>,
    ) -> ChildrenDisposition {
        if let Some(tracked) = self.manifests.get_mut(key)
            && tracked.chunk.state == ChunkState::RequestingChildren
        {
            tracked.chunk.state = ChunkState::Failed;
        }
        let children = match result {
            Ok(children) => children,
            Err(_) => return ChildrenDisposition::Failed { segment },
        };
        if !self.segments.root_segments.has(root) {
            tracing::debug!(%segment, %root, "Root deselected while children were requested");
            return ChildrenDisposition::Invalidated { root };
        }

        let count = children.len();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
            let update = pending.entry(root).or_default();
            for child in children {
                if !update.add.contains(&child) {
                    update.add.push(child);
                }
            }
            if !update.delete.contains(&segment) {
                update.delete.push(segment);
            }
        }
        let pending = self.pending.clone();
        let segments = self.segments.clone();
        self.debouncer.trigger(move || {
            apply_child_chunk_updates(&pending, &segments);
        });
        ChildrenDisposition::Accumulated {
            root,
            children: count,
        }
    }

    /// Applies the pending batch immediately instead of waiting for the debounce window
    pub fn flush_child_chunk_updates(&mut self) -> usize {
        self.debouncer.cancel();
        apply_child_chunk_updates(&self.pending, &self.segments)
    }

    pub fn pending_child_chunk_updates(&self) -> BTreeMap<RootId, ChildChunkUpdate> {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Moves a fragment's buffers out of the coordinator. The chunk keeps its bookkeeping only.
    pub fn hand_off_fragment(&mut self, key: &ChunkKey) -> Option<FragmentPayload> {
        let tracked = self.fragments.get_mut(key)?;
        let payload = tracked.chunk.payload.take()?;
        tracked.chunk.state = ChunkState::SystemMemory;
        Some(payload)
    }

    /// Puts a failed manifest back in the queue and re-arms its graph fallback
    pub fn retry_manifest(&mut self, key: &ChunkKey) -> bool {
        match self.manifests.get_mut(key) {
            Some(tracked) if tracked.chunk.state == ChunkState::Failed => {
                tracked.chunk.state = ChunkState::Queued;
                tracked.chunk.children_requested = false;
                true
            }
            _ => false,
        }
    }

    pub fn mark_gpu_resident(&mut self, key: &ChunkKey) -> bool {
        match self.fragments.get_mut(key) {
            Some(tracked) if tracked.chunk.state.is_loaded() => {
                tracked.chunk.state = ChunkState::GpuMemory;
                true
            }
            _ => false,
        }
    }

    /// Drops a manifest and every fragment it owns, cancelling their downloads
    pub fn evict_manifest(&mut self, key: &ChunkKey) -> bool {
        let Some(mut manifest) = self.manifests.remove(key) else {
            return false;
        };
        manifest.cancel();
        self.fragments.retain(|_, tracked| {
            if &tracked.chunk.manifest_key == key {
                tracked.cancel();
                false
            } else {
                true
            }
        });
        true
    }

    /// Bytes of decoded payload still held by the coordinator
    pub fn memory_usage(&self) -> usize {
        self.fragments
            .values()
            .map(|tracked| tracked.chunk.system_memory_bytes())
            .sum()
    }

    pub fn chunk_state(&self, key: &ChunkKey) -> Option<ChunkState> {
        self.manifests
            .get(key)
            .map(|tracked| tracked.chunk.state)
            .or_else(|| self.fragments.get(key).map(|tracked| tracked.chunk.state))
    }

    /// Priority from the latest pass. Known chunks that were not requested report `Recent`.
    pub fn chunk_priority(&self, key: &ChunkKey) -> Option<(PriorityTier, f64)> {
        if let Some(request) = self.queue.get(key) {
            return Some((request.tier, request.priority));
        }
        (self.manifests.contains_key(key) || self.fragments.contains_key(key))
            .then_some((PriorityTier::Recent, 0.0))
    }

    pub fn manifest(&self, key: &ChunkKey) -> Option<&ManifestChunk> {
        self.manifests.get(key).map(|tracked| &tracked.chunk)
    }

    pub fn fragment(&self, key: &ChunkKey) -> Option<&FragmentChunk> {
        self.fragments.get(key).map(|tracked| &tracked.chunk)
    }

    pub fn manifest_keys(&self) -> Vec<ChunkKey> {
        let mut keys: Vec<ChunkKey> = self.manifests.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn fragment_keys(&self) -> Vec<ChunkKey> {
        let mut keys: Vec<ChunkKey> = self.fragments.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// No downloads, graph queries or batched updates outstanding
    pub fn is_idle(&self) -> bool {
        self.in_flight_count() == 0
            && !self.debouncer.is_pending()
            && self
                .manifests
                .values()
                .all(|tracked| tracked.chunk.state != ChunkState::RequestingChildren)
    }

    pub fn in_flight_count(&self) -> usize {
        self.manifests
            .values()
            .filter(|tracked| tracked.in_flight.is_some())
            .count()
            + self
                .fragments
                .values()
                .filter(|tracked| tracked.in_flight.is_some())
                .count()
    }

    /// Starts the graph fallback for a failed manifest. Runs once per failure; only
    /// [`MeshOrchestrator::retry_manifest`] allows another attempt.
    fn request_children(&mut self, key: &ChunkKey, segment: SegmentId, root: RootId) {
        if !self.graph.is_configured() {
            return;
        }
        if self.pending_delete_contains(segment) {
            tracing::trace!(%segment, "Children already pending");
            return;
        }
        let Some(tracked) = self.manifests.get_mut(key) else {
            return;
        };
        if tracked.chunk.state != ChunkState::Failed || tracked.chunk.children_requested {
            return;
        }
        tracked.chunk.state = ChunkState::RequestingChildren;
        tracked.chunk.children_requested = true;

        let children = self.graph.get_children(segment);
        let send = self.event_send.clone();
        let key = key.clone();
        self.runtime.spawn(async move {
            let result = children.await;
            if let Err(e) = send.send(ChunkEvent::Children {
                key,
                segment,
                root,
                result,
            }) {
                tracing::error!("Failed to send chunk event: {:?}", e);
            }
        });
    }

    fn pending_delete_contains(&self, segment: SegmentId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .any(|update| update.delete.contains(&segment))
    }
}

/// Marks the chunk as downloading and runs its download on the runtime. Returns `false` if the
/// chunk is not queued.
fn start_download<C>(
    tracked: &mut Tracked<C>,
    generation: u64,
    runtime: &Handle,
    source: &Arc<MeshSource>,
    send: &crossbeam_channel::Sender<ChunkEvent>,
    wrap: fn(u64, C, Result<(), StreamError>) -> ChunkEvent,
) -> bool
where
    C: StreamChunk + Clone,
    MeshSource: ChunkSource<C>,
{
    if tracked.chunk.state() != ChunkState::Queued {
        return false;
    }
    let token = CancellationToken::new();
    tracked.chunk.set_state(ChunkState::Downloading);
    tracked.in_flight = Some(InFlight {
        generation,
        token: token.clone(),
    });

    let mut chunk = tracked.chunk.clone();
    let source = source.clone();
    let send = send.clone();
    runtime.spawn(async move {
        let result = download_chunk(source.as_ref(), &mut chunk, token).await;
        if let Err(e) = send.send(wrap(generation, chunk, result)) {
            tracing::error!("Failed to send chunk event: {:?}", e);
        }
    });
    true
}

/// Applies and clears the pending batch. Roots that are no longer selected are skipped.
/// Returns the number of roots applied.
pub fn apply_child_chunk_updates(
    pending: &Mutex<BTreeMap<RootId, ChildChunkUpdate>>,
    segments: &DisplaySegments,
) -> usize {
    let batch = std::mem::take(&mut *pending.lock().unwrap_or_else(|p| p.into_inner()));
    let mut applied = 0;
    for (root, update) in batch {
        if !segments.root_segments.has(root) {
            tracing::debug!(%root, "Root deselected before child update was applied");
            continue;
        }
        for segment in &update.delete {
            segments.visible_segments_3d.delete(*segment);
        }
        for child in &update.add {
            segments.visible_segments_3d.add(*child);
            segments.equivalences.link(root, *child);
        }
        tracing::debug!(
            %root,
            added = update.add.len(),
            deleted = update.delete.len(),
            "Applied child chunk update"
        );
        applied += 1;
    }
    applied
}
