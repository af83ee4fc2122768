//! Layer and scheduler configuration, loaded from JSON.

use serde::Deserialize;
use std::path::Path;
use vox_decode::{DataType, VertexAttributeInfo, VolumeEncoding};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// `None` means no graph server is configured
    pub graph: Option<GraphConfig>,
    pub mesh: MeshSourceConfig,
    pub skeleton: Option<SkeletonSourceConfig>,
    pub volume: Option<VolumeSourceConfig>,
    pub scheduler: SchedulerConfig,
    pub log_level: LogLevel,
}

impl StreamConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeshSourceConfig {
    pub url: String,
    #[serde(default)]
    pub lod: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkeletonSourceConfig {
    pub url: String,
    /// Read back-to-back in this order after the vertex positions
    #[serde(default)]
    pub vertex_attributes: Vec<(String, VertexAttributeInfo)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeSourceConfig {
    pub url: String,
    pub path: String,
    pub encoding: VolumeEncoding,
    pub data_type: DataType,
    #[serde(default = "default_channels")]
    pub num_channels: u32,
    pub chunk_size: [u32; 3],
    #[serde(default)]
    pub voxel_offset: [i64; 3],
    pub volume_size: [u64; 3],
    #[serde(default = "default_block_size")]
    pub compressed_segmentation_block_size: [u32; 3],
}

fn default_channels() -> u32 {
    1
}

fn default_block_size() -> [u32; 3] {
    [8, 8, 8]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_concurrent_downloads: usize,
    pub debounce_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 8,
            debounce_ms: 100,
        }
    }
}

impl SchedulerConfig {
    pub fn debounce_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::from_json(r#"{"mesh": {"url": "http://mesh"}}"#).unwrap();
        assert!(config.graph.is_none());
        assert_eq!(config.mesh.url, "http://mesh");
        assert_eq!(config.mesh.lod, None);
        assert_eq!(config.scheduler.max_concurrent_downloads, 8);
        assert_eq!(config.scheduler.debounce_ms, 100);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_full_config() {
        let config = StreamConfig::from_json(
            r#"{
                "graph": {"url": "http://graph"},
                "mesh": {"url": "http://mesh", "lod": 2},
                "skeleton": {
                    "url": "http://skeleton",
                    "vertex_attributes": [["radius", {"data_type": "float32", "num_components": 1}]]
                },
                "volume": {
                    "url": "http://volume",
                    "path": "8_8_40",
                    "encoding": "compressed_segmentation",
                    "data_type": "uint64",
                    "chunk_size": [64, 64, 64],
                    "volume_size": [1000, 1000, 100]
                },
                "scheduler": {"debounce_ms": 20},
                "log_level": "debug"
            }"#,
        )
        .unwrap();
        assert_eq!(config.graph.unwrap().url, "http://graph");
        assert_eq!(config.mesh.lod, Some(2));
        let skeleton = config.skeleton.unwrap();
        assert_eq!(skeleton.vertex_attributes[0].0, "radius");
        assert_eq!(skeleton.vertex_attributes[0].1.data_type, DataType::Float32);
        let volume = config.volume.unwrap();
        assert_eq!(volume.encoding, VolumeEncoding::CompressedSegmentation);
        assert_eq!(volume.num_channels, 1);
        assert_eq!(volume.compressed_segmentation_block_size, [8, 8, 8]);
        assert_eq!(config.scheduler.debounce_ms, 20);
        assert_eq!(config.scheduler.max_concurrent_downloads, 8);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_bad_json() {
        assert!(StreamConfig::from_json("{").is_err());
    }
}
