use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use vox_stream::prelude::*;

const USAGE: &str = "usage: voxstream <config.json> <segment id>...";
const PASS_INTERVAL: Duration = Duration::from_millis(50);
const MAX_PASSES: usize = 1200;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = StreamConfig::from_path(args.next().context(USAGE)?)?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(config.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let segments = args
        .map(|arg| arg.parse::<SegmentId>())
        .collect::<Result<Vec<_>, _>>()?;
    anyhow::ensure!(!segments.is_empty(), USAGE);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config, segments))
}

async fn run(config: StreamConfig, selected: Vec<SegmentId>) -> anyhow::Result<()> {
    let fetch: Arc<dyn Fetch> = Arc::new(HttpFetcher::default());
    let graph = Arc::new(ChunkedGraphClient::new(config.graph.as_ref(), fetch.clone()));
    let display = DisplaySegments::new();
    let actions = SegmentationActions::new(graph.clone(), display.clone());
    for segment in &selected {
        let root = actions
            .select(SegmentSelection::new(*segment, [0.0; 3]))
            .await?;
        tracing::info!(%segment, %root, "Selected");
    }

    if let Some(skeleton) = &config.skeleton {
        let source = SkeletonSource::new(skeleton.clone(), fetch.clone());
        for segment in &selected {
            let mut chunk = SkeletonChunk::new(*segment);
            if download_chunk(&source, &mut chunk, CancellationToken::new())
                .await
                .is_ok()
                && let Some(geometry) = &chunk.geometry
            {
                tracing::info!(
                    %segment,
                    vertices = geometry.num_vertices(),
                    edges = geometry.num_edges(),
                    "Skeleton loaded"
                );
            }
        }
    }

    if let Some(volume) = &config.volume {
        let source = VolumeSource::new(volume.clone(), fetch.clone());
        let mut chunk = VolumeChunk::new([0, 0, 0]);
        if download_chunk(&source, &mut chunk, CancellationToken::new())
            .await
            .is_ok()
        {
            tracing::info!(
                bounds = ?chunk.bounds,
                bytes = chunk.system_memory_bytes(),
                "Volume chunk loaded"
            );
        }
    }

    let mesh = Arc::new(MeshSource::new(config.mesh.clone(), fetch.clone()));
    let mut orchestrator = MeshOrchestrator::new(
        mesh,
        graph,
        display.clone(),
        config.scheduler.clone(),
        Handle::current(),
    );

    let mut interval = tokio::time::interval(PASS_INTERVAL);
    let mut vertices = 0;
    for _ in 0..MAX_PASSES {
        interval.tick().await;
        for disposition in orchestrator.tick(f64::INFINITY) {
            tracing::info!(?disposition, "Children response");
        }
        for key in orchestrator.fragment_keys() {
            if let Some(payload) = orchestrator.hand_off_fragment(&key) {
                vertices += payload.vertex_positions.len() / 3;
                orchestrator.mark_gpu_resident(&key);
            }
        }
        if orchestrator.is_idle() {
            break;
        }
    }

    for key in orchestrator.manifest_keys() {
        if let Some(manifest) = orchestrator.manifest(&key) {
            tracing::info!(
                %key,
                state = ?manifest.state,
                fragments = manifest.fragment_ids.as_ref().map_or(0, Vec::len),
                "Manifest"
            );
        }
    }
    let visible = display.visible_segments_3d.to_vec();
    tracing::info!(
        ?visible,
        vertices,
        "Streaming finished"
    );
    Ok(())
}
