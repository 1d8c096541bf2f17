//! Chunk meshing: padded density grids, marching cubes extraction and
//! collision volumes

pub mod collider;
pub mod grid;
pub mod marching_cubes;
pub mod tables;

pub use collider::TriMeshCollider;
pub use grid::DensityGrid;
pub use marching_cubes::{ChunkMesh, MeshOptions, MeshVertex, SurfaceExtractor};

use glam::Vec3;

use crate::generation::DensityField;
use crate::world::ChunkIndex;

/// Hash key identifying an exact vertex position (`-0.0` and `0.0` collide)
#[inline]
pub(crate) fn position_key(p: Vec3) -> [u32; 3] {
    let p = p + Vec3::ZERO;
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Mesh one chunk. `None` when the chunk is empty: either no sample is in
/// range or the surface never crosses it.
pub fn build_chunk_mesh(
    field: &DensityField<'_>,
    extractor: &SurfaceExtractor,
    chunk: ChunkIndex,
) -> Option<ChunkMesh> {
    let grid = DensityGrid::build(field, chunk)?;
    let mesh = extractor.extract(&grid);
    if mesh.is_empty() { None } else { Some(mesh) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_key_signed_zero() {
        assert_eq!(position_key(Vec3::new(-0.0, 1.0, 0.0)), position_key(Vec3::new(0.0, 1.0, -0.0)));
        assert_ne!(position_key(Vec3::X), position_key(Vec3::Y));
    }
}
