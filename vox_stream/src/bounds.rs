use std::fmt;

/// Axis-aligned voxel box, `min` inclusive and `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoxelBounds {
    pub min: [i64; 3],
    pub max: [i64; 3],
}

impl VoxelBounds {
    pub fn new(min: [i64; 3], max: [i64; 3]) -> Self {
        Self { min, max }
    }

    /// Bounds of the chunk at `grid`. Chunks on the far edge of the volume are clipped to it.
    pub fn for_chunk(
        grid: [u64; 3],
        chunk_size: [u32; 3],
        voxel_offset: [i64; 3],
        volume_size: [u64; 3],
    ) -> Self {
        let mut min = [0i64; 3];
        let mut max = [0i64; 3];
        let clamp = |value: u64| i64::try_from(value).unwrap_or(i64::MAX);
        for axis in 0..3 {
            let chunk = i64::from(chunk_size[axis]);
            min[axis] = voxel_offset[axis].saturating_add(clamp(grid[axis]).saturating_mul(chunk));
            max[axis] = min[axis]
                .saturating_add(chunk)
                .min(voxel_offset[axis].saturating_add(clamp(volume_size[axis])));
        }
        Self { min, max }
    }

    /// Per-axis extent; inverted boxes report zero
    pub fn size(&self) -> [u32; 3] {
        [0, 1, 2].map(|axis| {
            self.max[axis]
                .saturating_sub(self.min[axis])
                .clamp(0, i64::from(u32::MAX)) as u32
        })
    }

    pub fn is_empty(&self) -> bool {
        self.size().contains(&0)
    }

    pub fn contains(&self, point: [i64; 3]) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] < self.max[axis])
    }
}

/// `x0-x1_y0-y1_z0-z1`, used both as a volume path token and as a `bounds` query value
impl fmt::Display for VoxelBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}_{}-{}_{}-{}",
            self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2]
        )
    }
}
