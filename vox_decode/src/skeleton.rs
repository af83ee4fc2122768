use crate::geometry::{decode_vertex_positions_and_indices, read_u32_le};
use crate::{DataType, DecodeError, endian};

/// Layout of one per-vertex attribute. The schema comes from source configuration, never from
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct VertexAttributeInfo {
    pub data_type: DataType,
    pub num_components: u32,
}

impl VertexAttributeInfo {
    pub fn bytes_per_vertex(&self) -> usize {
        self.data_type
            .size_in_bytes()
            .saturating_mul(self.num_components as usize)
    }
}

/// A decoded vertex attribute, in native byte order
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub name: String,
    pub info: VertexAttributeInfo,
    pub data: Vec<u8>,
}

impl VertexAttribute {
    pub fn as_f32(&self) -> Option<Vec<f32>> {
        matches!(self.info.data_type, DataType::Float32)
            .then(|| bytemuck::pod_collect_to_vec::<u8, f32>(&self.data))
    }

    pub fn as_u32(&self) -> Option<Vec<u32>> {
        matches!(self.info.data_type, DataType::Uint32)
            .then(|| bytemuck::pod_collect_to_vec::<u8, u32>(&self.data))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkeletonGeometry {
    pub vertex_positions: Vec<f32>,
    /// Edge endpoints, two per edge
    pub indices: Vec<u32>,
    pub attributes: Vec<VertexAttribute>,
}

impl SkeletonGeometry {
    pub fn num_vertices(&self) -> usize {
        self.vertex_positions.len() / 3
    }

    pub fn num_edges(&self) -> usize {
        self.indices.len() / 2
    }

    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

/// Skeleton layout: `u32` vertex count, `u32` edge count, positions, attribute blocks in schema
/// order, then `2 * edge count` indices.
pub fn decode_skeleton(
    data: &[u8],
    vertex_attributes: &[(String, VertexAttributeInfo)],
) -> Result<SkeletonGeometry, DecodeError> {
    let num_vertices = read_u32_le(data, 0)? as usize;
    let num_edges = read_u32_le(data, 4)? as usize;
    let vertex_byte_offset = 8;

    let overflow = || DecodeError::Truncated {
        needed: usize::MAX,
        available: data.len(),
    };

    let mut offset = num_vertices
        .checked_mul(12)
        .and_then(|len| len.checked_add(vertex_byte_offset))
        .ok_or_else(overflow)?;
    let mut attributes = Vec::with_capacity(vertex_attributes.len());
    for (name, info) in vertex_attributes {
        let end = num_vertices
            .checked_mul(info.bytes_per_vertex())
            .and_then(|len| offset.checked_add(len))
            .ok_or_else(overflow)?;
        let bytes = data.get(offset..end).ok_or(DecodeError::Truncated {
            needed: end,
            available: data.len(),
        })?;
        let mut attribute = bytes.to_vec();
        endian::convert_endian(&mut attribute, info.data_type.size_in_bytes());
        attributes.push(VertexAttribute {
            name: name.clone(),
            info: *info,
            data: attribute,
        });
        offset = end;
    }

    let geometry = decode_vertex_positions_and_indices(
        data,
        2,
        vertex_byte_offset,
        num_vertices,
        Some(offset),
        Some(num_edges),
    )?;
    Ok(SkeletonGeometry {
        vertex_positions: geometry.vertex_positions,
        indices: geometry.indices,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radius_info() -> (String, VertexAttributeInfo) {
        (
            "radius".to_string(),
            VertexAttributeInfo {
                data_type: DataType::Float32,
                num_components: 1,
            },
        )
    }

    fn label_info() -> (String, VertexAttributeInfo) {
        (
            "label".to_string(),
            VertexAttributeInfo {
                data_type: DataType::Uint32,
                num_components: 2,
            },
        )
    }

    fn encode_skeleton(positions: &[f32], edges: &[u32], radius: &[f32], labels: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((positions.len() / 3) as u32).to_le_bytes());
        out.extend_from_slice(&((edges.len() / 2) as u32).to_le_bytes());
        positions.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()));
        radius.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()));
        labels.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()));
        edges.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()));
        out
    }

    #[test]
    fn test_skeleton_with_attributes() {
        let positions = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 0.0, 2.0];
        let edges = [0, 1, 1, 2];
        let radius = [0.5, 1.5, 2.5];
        let labels = [1, 2, 3, 4, 5, 6];
        let data = encode_skeleton(&positions, &edges, &radius, &labels);

        let skeleton = decode_skeleton(&data, &[radius_info(), label_info()]).unwrap();
        assert_eq!(skeleton.vertex_positions, positions.to_vec());
        assert_eq!(skeleton.indices, edges.to_vec());
        assert_eq!(skeleton.num_edges(), 2);
        assert_eq!(
            skeleton.attribute("radius").and_then(|a| a.as_f32()),
            Some(radius.to_vec())
        );
        assert_eq!(
            skeleton.attribute("label").and_then(|a| a.as_u32()),
            Some(labels.to_vec())
        );
        assert_eq!(skeleton.attribute("radius").and_then(|a| a.as_u32()), None);
    }

    #[test]
    fn test_skeleton_without_attributes_ignores_trailing() {
        let positions = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let data = encode_skeleton(&positions, &[0, 1], &[9.0, 9.0], &[]);
        let skeleton = decode_skeleton(&data, &[]).unwrap();
        // without a schema the radius block is read as indices, only one edge is taken
        assert_eq!(skeleton.num_vertices(), 2);
        assert_eq!(skeleton.indices.len(), 2);
    }

    #[test]
    fn test_truncated_attribute_block() {
        let positions = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let data = encode_skeleton(&positions, &[], &[0.5], &[]);
        assert!(matches!(
            decode_skeleton(&data, &[radius_info()]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_oversized_attribute_schema_is_an_error() {
        let mut data = u32::MAX.to_le_bytes().to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        let wide = (
            "wide".to_string(),
            VertexAttributeInfo {
                data_type: DataType::Uint64,
                num_components: u32::MAX,
            },
        );
        assert!(matches!(
            decode_skeleton(&data, &[wide]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_truncated_edges() {
        let positions = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut data = encode_skeleton(&positions, &[0, 1], &[], &[]);
        data.truncate(data.len() - 2);
        assert!(matches!(
            decode_skeleton(&data, &[]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
