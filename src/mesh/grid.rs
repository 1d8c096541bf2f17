//! Padded per-chunk scalar grid sampled from the density field.
//!
//! A chunk of `chunk_size` cells is sampled on `chunk_size + 3` points per
//! axis starting one cell below the chunk minimum, so the cells straddling
//! every chunk face are polygonised by both neighbours and trimmed later.

use glam::Vec3;

use crate::generation::DensityField;
use crate::math::Aabb;
use crate::world::ChunkIndex;

/// Scores of one chunk's padded sample points
#[derive(Clone, Debug, PartialEq)]
pub struct DensityGrid {
    /// Minimum corner of the unpadded chunk
    chunk_min: Vec3,
    cell_size: f32,
    /// Points per axis
    dims: usize,
    /// Scores indexed by `i + dims * (j + dims * k)`
    scores: Vec<f32>,
    /// Exact chunk bounds used for seam trimming
    bounds: Aabb,
}

impl DensityGrid {
    /// Sample the field over one chunk.
    ///
    /// Returns `None` when any point has no sample in range, which marks the
    /// chunk permanently empty.
    pub fn build(field: &DensityField<'_>, chunk: ChunkIndex) -> Option<Self> {
        if !field.has_samples_near(chunk) {
            return None;
        }

        let layout = field.layout();
        let dims = layout.chunk_size as usize + 3;
        let cell_size = layout.cell_size;
        let chunk_min = layout.index_to_chunk(chunk);

        let mut scores = Vec::with_capacity(dims * dims * dims);
        for k in 0..dims {
            for j in 0..dims {
                for i in 0..dims {
                    let p = grid_point(chunk_min, cell_size, i, j, k);
                    scores.push(field.score(p, chunk)?);
                }
            }
        }

        Some(Self {
            chunk_min,
            cell_size,
            dims,
            scores,
            bounds: layout.chunk_bounds(chunk),
        })
    }

    /// Build a grid from precomputed scores.
    ///
    /// Point `(i, j, k)` sits at `chunk_min + (i - 1, j - 1, k - 1) * cell_size`.
    /// Returns `None` if `dims < 2` or the score count is not `dims³`.
    pub fn from_scores(
        chunk_min: Vec3,
        cell_size: f32,
        dims: usize,
        scores: Vec<f32>,
        bounds: Aabb,
    ) -> Option<Self> {
        if dims < 2 || scores.len() != dims * dims * dims {
            return None;
        }
        Some(Self { chunk_min, cell_size, dims, scores, bounds })
    }

    /// Points per axis
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Cells per axis
    pub fn cells(&self) -> usize {
        self.dims - 1
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Exact bounds of the chunk this grid pads
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[inline]
    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims * (j + self.dims * k)
    }

    /// Score at a grid point
    #[inline]
    pub fn score(&self, i: usize, j: usize, k: usize) -> f32 {
        self.scores[self.offset(i, j, k)]
    }

    /// World position of a grid point
    #[inline]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Vec3 {
        grid_point(self.chunk_min, self.cell_size, i, j, k)
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }
}

/// Offsets are taken from the chunk minimum so points on the chunk faces
/// land exactly on the chunk bounds.
#[inline]
fn grid_point(chunk_min: Vec3, cell_size: f32, i: usize, j: usize, k: usize) -> Vec3 {
    let step = |n: usize| (n as f32 - 1.0) * cell_size;
    chunk_min + Vec3::new(step(i), step(j), step(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{CurveSample, Skeleton};
    use crate::world::WorldLayout;

    fn setup() -> (Skeleton, WorldLayout, ChunkIndex) {
        let layout = WorldLayout::new(8, 4, 1.0);
        let mut skeleton = Skeleton::new();
        let center = Vec3::new(1.0, 1.0, 1.0);
        let index = layout.chunk_to_index(center);
        skeleton.insert(index, CurveSample::new(center, 2.0));
        (skeleton, layout, index)
    }

    #[test]
    fn test_grid_dimensions_and_padding() {
        let (skeleton, layout, index) = setup();
        let field = DensityField::new(&skeleton, layout, 3.0, None);
        let grid = DensityGrid::build(&field, index).unwrap();

        assert_eq!(grid.dims(), 7);
        assert_eq!(grid.cells(), 6);
        assert_eq!(grid.scores().len(), 7 * 7 * 7);

        let bounds = layout.chunk_bounds(index);
        assert_eq!(grid.position(0, 0, 0), bounds.min - Vec3::ONE);
        assert_eq!(grid.position(1, 1, 1), bounds.min);
        assert_eq!(grid.position(5, 5, 5), bounds.max);
        assert_eq!(*grid.bounds(), bounds);
    }

    #[test]
    fn test_grid_scores_match_field() {
        let (skeleton, layout, index) = setup();
        let field = DensityField::new(&skeleton, layout, 3.0, None);
        let grid = DensityGrid::build(&field, index).unwrap();

        for (i, j, k) in [(0, 0, 0), (2, 3, 4), (6, 6, 6)] {
            let p = grid.position(i, j, k);
            assert_eq!(grid.score(i, j, k), field.score(p, index).unwrap());
        }
    }

    #[test]
    fn test_far_chunk_has_no_grid() {
        let (skeleton, layout, _) = setup();
        let field = DensityField::new(&skeleton, layout, 3.0, None);
        assert!(DensityGrid::build(&field, ChunkIndex::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_from_scores_validates_length() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(DensityGrid::from_scores(Vec3::ZERO, 1.0, 2, vec![0.0; 8], bounds).is_some());
        assert!(DensityGrid::from_scores(Vec3::ZERO, 1.0, 2, vec![0.0; 7], bounds).is_none());
        assert!(DensityGrid::from_scores(Vec3::ZERO, 1.0, 1, vec![0.0; 1], bounds).is_none());
    }
}
