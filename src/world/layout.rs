//! Mapping between world-space positions and chunk indices.
//!
//! The world is a cube of `world_size` chunks per axis centred on the origin.
//! Chunk `(0, 0, 0)` has its minimum corner at `-half_width` on every axis.

use glam::Vec3;

use super::chunk::ChunkIndex;
use crate::math::Aabb;

/// Fixed world geometry derived from the configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldLayout {
    /// Chunks per axis
    pub world_size: u32,
    /// Grid cells per chunk axis
    pub chunk_size: u32,
    /// Edge length of one grid cell in world units
    pub cell_size: f32,
}

impl WorldLayout {
    pub fn new(world_size: u32, chunk_size: u32, cell_size: f32) -> Self {
        Self { world_size, chunk_size, cell_size }
    }

    /// Edge length of one chunk in world units
    #[inline]
    pub fn chunk_extent(&self) -> f32 {
        self.chunk_size as f32 * self.cell_size
    }

    /// Half of the world's edge length
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.world_size as f32 * self.chunk_extent() * 0.5
    }

    /// Total number of chunks in the world
    pub fn chunk_count(&self) -> usize {
        let n = self.world_size as usize;
        n * n * n
    }

    /// Chunk index containing a world position (ChunkToIndex).
    ///
    /// The result is not clamped; positions outside the world produce indices
    /// outside `[0, world_size)`.
    pub fn chunk_to_index(&self, pos: Vec3) -> ChunkIndex {
        let cell = ((pos + Vec3::splat(self.half_width())) / self.chunk_extent()).floor();
        ChunkIndex::new(cell.x as i32, cell.y as i32, cell.z as i32)
    }

    /// Minimum-corner world position of a chunk (IndexToChunk)
    pub fn index_to_chunk(&self, index: ChunkIndex) -> Vec3 {
        Vec3::new(index.x as f32, index.y as f32, index.z as f32) * self.chunk_extent()
            - Vec3::splat(self.half_width())
    }

    /// Whether an index lies inside the world
    pub fn contains(&self, index: ChunkIndex) -> bool {
        let n = self.world_size as i32;
        (0..n).contains(&index.x) && (0..n).contains(&index.y) && (0..n).contains(&index.z)
    }

    /// Clamp an index into the world bounds
    pub fn clamp(&self, index: ChunkIndex) -> ChunkIndex {
        let max = self.world_size as i32 - 1;
        ChunkIndex::new(index.x.clamp(0, max), index.y.clamp(0, max), index.z.clamp(0, max))
    }

    /// Arena slot for an in-bounds index
    pub fn linear(&self, index: ChunkIndex) -> Option<usize> {
        if !self.contains(index) {
            return None;
        }
        let n = self.world_size as usize;
        Some(index.x as usize + index.y as usize * n + index.z as usize * n * n)
    }

    /// Inverse of [`linear`](Self::linear)
    pub fn from_linear(&self, slot: usize) -> ChunkIndex {
        let n = self.world_size as usize;
        ChunkIndex::new((slot % n) as i32, ((slot / n) % n) as i32, (slot / (n * n)) as i32)
    }

    /// Exact (unpadded) spatial bounds of a chunk
    pub fn chunk_bounds(&self, index: ChunkIndex) -> Aabb {
        let min = self.index_to_chunk(index);
        Aabb::new(min, min + Vec3::splat(self.chunk_extent()))
    }

    /// Spatial bounds of the whole world
    pub fn world_bounds(&self) -> Aabb {
        let h = self.half_width();
        Aabb::new(Vec3::splat(-h), Vec3::splat(h))
    }

    /// Neighbourhood radius, in chunks, that covers every sample able to
    /// influence a point closer than `surface_threshold`
    pub fn search_radius(&self, surface_threshold: f32) -> i32 {
        (surface_threshold / self.chunk_extent()).ceil() as i32 + 1
    }

    /// All in-bounds indices within Chebyshev `radius` of `center`.
    /// Out-of-range offsets are skipped.
    pub fn neighbourhood(&self, center: ChunkIndex, radius: i32) -> impl Iterator<Item = ChunkIndex> {
        let max = self.world_size as i32 - 1;
        let range = move |c: i32| c.saturating_sub(radius).max(0)..=c.saturating_add(radius).min(max);
        let (xs, ys, zs) = (range(center.x), range(center.y), range(center.z));
        zs.flat_map(move |z| {
            let xs = xs.clone();
            ys.clone().flat_map(move |y| xs.clone().map(move |x| ChunkIndex::new(x, y, z)))
        })
    }

    /// Every index in the world, in arena order
    pub fn indices(&self) -> impl Iterator<Item = ChunkIndex> + '_ {
        (0..self.chunk_count()).map(|slot| self.from_linear(slot))
    }
}
