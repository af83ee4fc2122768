use glam::Vec3;

/// Per-vertex normals for a triangle mesh, as flat `[x, y, z]` triples.
///
/// Each triangle contributes `normalize(cross(v1 - v0, v2 - v1))` to its three vertices and the
/// sums are normalized at the end. Degenerate triangles contribute nothing; a vertex whose sum is
/// zero keeps the zero vector. Triangles referencing a vertex past the end are skipped.
pub fn compute_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let num_vertices = positions.len() / 3;
    let vertex = |i: usize| Vec3::new(positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]);
    let mut normals = vec![Vec3::ZERO; num_vertices];

    for triangle in indices.chunks_exact(3) {
        let corners = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if corners.iter().any(|&i| i >= num_vertices) {
            continue;
        }
        let v0 = vertex(corners[0]);
        let v1 = vertex(corners[1]);
        let v2 = vertex(corners[2]);
        let face = (v1 - v0).cross(v2 - v1).normalize_or_zero();
        for corner in corners {
            normals[corner] += face;
        }
    }

    normals
        .into_iter()
        .flat_map(|normal| {
            let length = normal.length();
            let normal = if length > 0.0 && length.is_finite() {
                normal / length
            } else {
                normal
            };
            normal.to_array()
        })
        .collect()
}
