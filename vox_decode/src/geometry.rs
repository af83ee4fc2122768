use crate::DecodeError;

/// Vertex positions and primitive indices decoded from a mesh or skeleton buffer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGeometry {
    /// Flat `[x, y, z]` triples
    pub vertex_positions: Vec<f32>,
    /// Flat primitives, `vertices_per_primitive` entries each
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn num_vertices(&self) -> usize {
        self.vertex_positions.len() / 3
    }
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let end = offset.checked_add(4).ok_or(DecodeError::Truncated {
        needed: usize::MAX,
        available: data.len(),
    })?;
    let bytes = data.get(offset..end).ok_or(DecodeError::Truncated {
        needed: end,
        available: data.len(),
    })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn checked_range(data: &[u8], start: usize, len: usize) -> Result<&[u8], DecodeError> {
    let end = start.checked_add(len).ok_or(DecodeError::Truncated {
        needed: usize::MAX,
        available: data.len(),
    })?;
    data.get(start..end).ok_or(DecodeError::Truncated {
        needed: end,
        available: data.len(),
    })
}

/// Shared geometry routine for meshes and skeletons.
///
/// Reads `num_vertices` float triples starting at `vertex_byte_offset`, followed by the index
/// array. The index array starts at `index_byte_offset` (default: right after the positions) and
/// holds `num_primitives * vertices_per_primitive` entries, or runs to the end of the buffer when
/// `num_primitives` is `None`.
pub fn decode_vertex_positions_and_indices(
    data: &[u8],
    vertices_per_primitive: usize,
    vertex_byte_offset: usize,
    num_vertices: usize,
    index_byte_offset: Option<usize>,
    num_primitives: Option<usize>,
) -> Result<RawGeometry, DecodeError> {
    let position_bytes = checked_range(
        data,
        vertex_byte_offset,
        num_vertices.saturating_mul(3 * std::mem::size_of::<f32>()),
    )?;
    let vertex_positions: Vec<f32> = position_bytes
        .chunks_exact(4)
        .map(|word| f32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect();

    let index_start = index_byte_offset.unwrap_or(vertex_byte_offset + position_bytes.len());
    let index_bytes = match num_primitives {
        Some(count) => checked_range(
            data,
            index_start,
            count
                .saturating_mul(vertices_per_primitive)
                .saturating_mul(std::mem::size_of::<u32>()),
        )?,
        None => data.get(index_start..).ok_or(DecodeError::Truncated {
            needed: index_start,
            available: data.len(),
        })?,
    };
    if index_bytes.len() % 4 != 0 {
        return Err(DecodeError::Misaligned {
            len: index_bytes.len(),
            width: 4,
        });
    }
    let count = index_bytes.len() / 4;
    if vertices_per_primitive == 0 || count % vertices_per_primitive != 0 {
        return Err(DecodeError::IndexCount {
            count,
            vertices_per_primitive,
        });
    }
    let indices = index_bytes
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect();

    Ok(RawGeometry {
        vertex_positions,
        indices,
    })
}

/// Mesh fragment layout: `u32` vertex count, positions, triangle indices to the end of the buffer
pub fn decode_triangle_vertex_positions_and_indices(
    data: &[u8],
) -> Result<RawGeometry, DecodeError> {
    let num_vertices = read_u32_le(data, 0)? as usize;
    decode_vertex_positions_and_indices(data, 3, 4, num_vertices, None, None)
}
