//! Marching cubes surface extraction over a padded density grid.
//!
//! Each cell's eight corner scores are compared against the surface
//! threshold to form a cube index; crossed edges are linearly interpolated
//! and triangulated from the lookup tables. Normals are per face, optionally
//! averaged across coincident vertices, and triangles leaving the exact chunk
//! bounds are dropped so neighbouring chunks meet without overlap.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::grid::DensityGrid;
use super::position_key;
use super::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::generation::WorldConfig;
use crate::math::Aabb;

/// Extraction parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshOptions {
    /// Corners scoring below this are inside the tunnel
    pub surface_threshold: f32,
    /// Average normals of coincident vertices
    pub smooth_normals: bool,
    /// Drop zero-area triangles instead of emitting them with a zero normal
    pub cull_degenerate: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            surface_threshold: 5.0,
            smooth_normals: true,
            cull_degenerate: false,
        }
    }
}

impl MeshOptions {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            surface_threshold: config.surface_threshold,
            smooth_normals: config.smooth_normals,
            cull_degenerate: config.cull_degenerate,
        }
    }
}

/// GPU-ready vertex layout
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Unindexed triangle list: every three consecutive vertices form a triangle
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl ChunkMesh {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex positions grouped by triangle
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.positions.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Interleaved vertices for upload
    pub fn vertices(&self) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| MeshVertex { position: p.to_array(), normal: n.to_array() })
            .collect()
    }

    /// Bounds of all vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    fn push_triangle(&mut self, tri: [Vec3; 3], normal: Vec3) {
        self.positions.extend_from_slice(&tri);
        self.normals.extend_from_slice(&[normal; 3]);
    }
}

/// Polygonises density grids into chunk meshes
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceExtractor {
    options: MeshOptions,
}

impl SurfaceExtractor {
    pub fn new(options: MeshOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    /// Full extraction: polygonise, optionally smooth, then trim to the
    /// chunk bounds. Smoothing runs before the trim so vertices on a chunk
    /// face see the same neighbours from both sides.
    pub fn extract(&self, grid: &DensityGrid) -> ChunkMesh {
        let mut mesh = self.polygonise(grid);
        if self.options.smooth_normals {
            smooth_normals(&mut mesh);
        }
        trim_to_bounds(&mut mesh, grid.bounds());
        mesh
    }

    /// Triangulate every cell of the grid, padding included, with flat normals
    pub fn polygonise(&self, grid: &DensityGrid) -> ChunkMesh {
        let cells = grid.cells();
        let mut mesh = ChunkMesh::default();

        for k in 0..cells {
            for j in 0..cells {
                for i in 0..cells {
                    let mut positions = [Vec3::ZERO; 8];
                    let mut scores = [0.0f32; 8];
                    for (corner, &[di, dj, dk]) in CORNER_OFFSETS.iter().enumerate() {
                        positions[corner] = grid.position(i + di, j + dj, k + dk);
                        scores[corner] = grid.score(i + di, j + dj, k + dk);
                    }
                    self.polygonise_cell(&positions, &scores, &mut mesh);
                }
            }
        }

        mesh
    }

    fn polygonise_cell(&self, positions: &[Vec3; 8], scores: &[f32; 8], mesh: &mut ChunkMesh) {
        let threshold = self.options.surface_threshold;
        let index = cube_index(scores, threshold);
        if index == 0 || index == 255 {
            return;
        }

        let edges = EDGE_TABLE[index as usize];
        let mut edge_points = [Vec3::ZERO; 12];
        for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
            if edges & (1 << edge) != 0 {
                edge_points[edge] = interpolate(positions[a], positions[b], scores[a], scores[b], threshold);
            }
        }

        for tri in TRI_TABLE[index as usize].chunks_exact(3) {
            if tri[0] < 0 {
                break;
            }
            let tri = [
                edge_points[tri[0] as usize],
                edge_points[tri[1] as usize],
                edge_points[tri[2] as usize],
            ];
            let normal = face_normal(&tri);
            if self.options.cull_degenerate && normal == Vec3::ZERO {
                continue;
            }
            mesh.push_triangle(tri, normal);
        }
    }
}

/// Cube index of a cell: bit `n` set when corner `n` scores below the threshold
pub fn cube_index(scores: &[f32; 8], threshold: f32) -> u8 {
    let mut index = 0u8;
    for (corner, &score) in scores.iter().enumerate() {
        if score < threshold {
            index |= 1 << corner;
        }
    }
    index
}

/// Point on the segment `p1..p2` where the linearly interpolated score
/// equals `threshold`. Components shared by both endpoints are preserved
/// exactly.
pub fn interpolate(p1: Vec3, p2: Vec3, s1: f32, s2: f32, threshold: f32) -> Vec3 {
    if s1 == s2 {
        return p1;
    }
    let t = (threshold - s1) / (s2 - s1);
    p1 + (p2 - p1) * t
}

/// Unit face normal, zero for degenerate triangles
pub fn face_normal(tri: &[Vec3; 3]) -> Vec3 {
    (tri[0] - tri[1]).cross(tri[2] - tri[1]).normalize_or_zero()
}

/// Replace each vertex normal with the normalized sum of the normals of
/// every vertex sharing its exact position
pub fn smooth_normals(mesh: &mut ChunkMesh) {
    let mut sums: HashMap<[u32; 3], Vec3> = HashMap::with_capacity(mesh.positions.len() / 2);
    for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
        *sums.entry(position_key(*p)).or_insert(Vec3::ZERO) += *n;
    }
    for (p, n) in mesh.positions.iter().zip(mesh.normals.iter_mut()) {
        if let Some(sum) = sums.get(&position_key(*p)) {
            *n = sum.normalize_or_zero();
        }
    }
}

/// Drop every triangle with a vertex outside `bounds` (inclusive)
pub fn trim_to_bounds(mesh: &mut ChunkMesh, bounds: &Aabb) {
    let mut positions = Vec::with_capacity(mesh.positions.len());
    let mut normals = Vec::with_capacity(mesh.normals.len());

    for (tri, norms) in mesh.positions.chunks_exact(3).zip(mesh.normals.chunks_exact(3)) {
        if bounds.contains_triangle(&[tri[0], tri[1], tri[2]]) {
            positions.extend_from_slice(tri);
            normals.extend_from_slice(norms);
        }
    }

    mesh.positions = positions;
    mesh.normals = normals;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(threshold: f32) -> SurfaceExtractor {
        SurfaceExtractor::new(MeshOptions {
            surface_threshold: threshold,
            smooth_normals: false,
            cull_degenerate: false,
        })
    }

    /// Single cell spanning [0, 1]³ with corner scores in table order
    fn single_cell(corners: [f32; 8]) -> DensityGrid {
        let mut scores = vec![0.0; 8];
        for (corner, &[di, dj, dk]) in CORNER_OFFSETS.iter().enumerate() {
            scores[di + 2 * (dj + 2 * dk)] = corners[corner];
        }
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        DensityGrid::from_scores(Vec3::ONE, 1.0, 2, scores, bounds).unwrap()
    }

    /// Padded 4³ grid around the cell [1, 2]³ scored by `|p - center|²`
    fn sphere_grid(center: Vec3) -> DensityGrid {
        let dims = 4;
        let mut scores = Vec::with_capacity(dims * dims * dims);
        for k in 0..dims {
            for j in 0..dims {
                for i in 0..dims {
                    let p = Vec3::new(i as f32, j as f32, k as f32);
                    scores.push(p.distance_squared(center));
                }
            }
        }
        let bounds = Aabb::new(Vec3::ONE, Vec3::splat(2.0));
        DensityGrid::from_scores(Vec3::ONE, 1.0, dims, scores, bounds).unwrap()
    }

    #[test]
    fn test_cube_index_bits() {
        let mut scores = [10.0; 8];
        assert_eq!(cube_index(&scores, 5.0), 0);
        scores[0] = 1.0;
        scores[6] = 4.9;
        assert_eq!(cube_index(&scores, 5.0), 0b0100_0001);
        // Equal to the threshold counts as outside
        scores[3] = 5.0;
        assert_eq!(cube_index(&scores, 5.0), 0b0100_0001);
        assert_eq!(cube_index(&[0.0; 8], 5.0), 255);
    }

    #[test]
    fn test_uniform_cells_produce_nothing() {
        let e = extractor(5.0);
        assert!(e.extract(&single_cell([10.0; 8])).is_empty());
        assert!(e.extract(&single_cell([0.0; 8])).is_empty());
    }

    #[test]
    fn test_single_corner_case() {
        let mut corners = [10.0; 8];
        corners[0] = 0.0;
        let mesh = extractor(5.0).extract(&single_cell(corners));

        assert_eq!(mesh.triangle_count(), 1);
        let tri = mesh.triangles().next().unwrap();
        let mut expected = [
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
        ];
        let mut got = tri;
        got.sort_by(|a, b| a.to_array().partial_cmp(&b.to_array()).unwrap());
        expected.sort_by(|a, b| a.to_array().partial_cmp(&b.to_array()).unwrap());
        assert_eq!(got, expected);

        let n = mesh.normals[0];
        assert!((n.length() - 1.0).abs() < 1e-5);
        assert!(n.cross(Vec3::ONE).length() < 1e-5);
        assert_eq!(mesh.normals[0], mesh.normals[1]);
        assert_eq!(mesh.normals[1], mesh.normals[2]);
    }

    #[test]
    fn test_interpolate() {
        let p = interpolate(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), 1.0, 5.0, 2.0);
        assert_eq!(p, Vec3::new(0.0, 0.5, 0.0));
        // Shared components are exact
        let p = interpolate(Vec3::new(0.3, 1.0, 7.1), Vec3::new(0.3, 2.0, 7.1), 0.0, 3.0, 1.7);
        assert_eq!(p.x, 0.3);
        assert_eq!(p.z, 7.1);
    }

    #[test]
    fn test_degenerate_triangle_policy() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        assert_eq!(face_normal(&tri), Vec3::ZERO);

        let mut mesh = ChunkMesh::default();
        mesh.push_triangle(tri, face_normal(&tri));
        assert!(mesh.normals.iter().all(|n| n.is_finite()));
    }

    #[test]
    fn test_extract_degenerate_cell_with_and_without_culling() {
        // Only corner 7 is outside and it sits on the threshold, so every
        // crossing collapses onto it
        let mut corners = [0.0; 8];
        corners[7] = 5.0;
        let grid = single_cell(corners);

        let kept = extractor(5.0).extract(&grid);
        assert_eq!(kept.triangle_count(), 1);
        let corner = Vec3::new(0.0, 1.0, 1.0);
        assert!(kept.positions.iter().all(|&p| p == corner));
        assert!(kept.normals.iter().all(|&n| n == Vec3::ZERO));

        let culling = SurfaceExtractor::new(MeshOptions {
            surface_threshold: 5.0,
            smooth_normals: false,
            cull_degenerate: true,
        });
        assert!(culling.extract(&grid).is_empty());
    }

    #[test]
    fn test_trim_keeps_only_triangles_inside_bounds() {
        let grid = sphere_grid(Vec3::new(1.2, 1.3, 1.4));
        let e = extractor(0.5);

        let raw = e.polygonise(&grid);
        let trimmed = e.extract(&grid);

        assert!(!trimmed.is_empty());
        assert!(trimmed.triangle_count() < raw.triangle_count());
        for tri in trimmed.triangles() {
            assert!(grid.bounds().contains_triangle(&tri));
        }
    }

    #[test]
    fn test_smoothing_averages_shared_vertices() {
        let shared = Vec3::ZERO;
        let a = [shared, Vec3::X, Vec3::Y];
        let b = [shared, Vec3::Z, Vec3::X];
        let mut mesh = ChunkMesh::default();
        mesh.push_triangle(a, Vec3::Z);
        mesh.push_triangle(b, Vec3::Y);

        smooth_normals(&mut mesh);

        let expected = (Vec3::Z + Vec3::Y).normalize();
        assert_eq!(mesh.normals[0], expected);
        assert_eq!(mesh.normals[3], expected);
        // Vec3::X is shared too
        assert_eq!(mesh.normals[1], expected);
        assert_eq!(mesh.normals[5], expected);
        // Unshared vertices keep their face normal
        assert_eq!(mesh.normals[2], Vec3::Z);
        assert_eq!(mesh.normals[4], Vec3::Y);
    }

    #[test]
    fn test_smoothing_runs_before_trim() {
        let grid = sphere_grid(Vec3::new(1.2, 1.3, 1.4));
        let smooth = SurfaceExtractor::new(MeshOptions {
            surface_threshold: 0.5,
            smooth_normals: true,
            cull_degenerate: false,
        });

        let mut reference = smooth.polygonise(&grid);
        smooth_normals(&mut reference);
        trim_to_bounds(&mut reference, grid.bounds());

        assert_eq!(smooth.extract(&grid), reference);
    }

    #[test]
    fn test_vertices_are_pod() {
        let mut corners = [10.0; 8];
        corners[0] = 0.0;
        let mesh = extractor(5.0).extract(&single_cell(corners));
        let vertices = mesh.vertices();
        assert_eq!(vertices.len(), 3);
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 3 * std::mem::size_of::<MeshVertex>());
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }
}
