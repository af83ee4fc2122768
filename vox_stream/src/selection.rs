//! User-facing segmentation edits. Graph failures are returned to the caller unchanged.

use crate::StreamError;
use crate::graph::{ChunkedGraph, SegmentSelection};
use crate::segments::DisplaySegments;
use derivative::Derivative;
use std::sync::Arc;
use vox_containers::prelude::RootId;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct SegmentationActions {
    #[derivative(Debug = "ignore")]
    graph: Arc<dyn ChunkedGraph>,
    segments: DisplaySegments,
}

impl SegmentationActions {
    pub fn new(graph: Arc<dyn ChunkedGraph>, segments: DisplaySegments) -> Self {
        Self { graph, segments }
    }

    pub fn segments(&self) -> &DisplaySegments {
        &self.segments
    }

    /// Resolves the root of a picked segment and shows it
    pub async fn select(&self, selection: SegmentSelection) -> Result<RootId, StreamError> {
        let root = self.graph.get_root(selection).await?;
        self.show(root);
        self.segments.equivalences.link(root, selection.segment);
        Ok(root)
    }

    pub fn deselect(&self, root: RootId) {
        self.segments.root_segments.delete(root);
        self.segments.visible_segments_3d.delete(root);
    }

    pub async fn merge(
        &self,
        first: SegmentSelection,
        second: SegmentSelection,
    ) -> Result<RootId, StreamError> {
        let previous = [
            self.segments.root_of(first.segment),
            self.segments.root_of(second.segment),
        ];
        let root = self.graph.merge_segments(first, second).await?;
        previous.into_iter().for_each(|old| self.deselect(old));
        self.show(root);
        self.segments.equivalences.link(root, first.segment);
        self.segments.equivalences.link(root, second.segment);
        Ok(root)
    }

    pub async fn split(
        &self,
        sources: Vec<SegmentSelection>,
        sinks: Vec<SegmentSelection>,
    ) -> Result<Vec<RootId>, StreamError> {
        let previous: Vec<RootId> = sources
            .iter()
            .chain(sinks.iter())
            .map(|s| self.segments.root_of(s.segment))
            .collect();
        let roots = self.graph.split_segments(sources, sinks).await?;
        previous.into_iter().for_each(|old| self.deselect(old));
        roots.iter().for_each(|root| self.show(*root));
        Ok(roots)
    }

    fn show(&self, root: RootId) {
        self.segments.root_segments.add(root);
        self.segments.visible_segments_3d.add(root);
    }
}
