//! Static triangle-mesh collision volume for a chunk

use std::collections::HashMap;

use glam::Vec3;

use super::marching_cubes::ChunkMesh;
use super::position_key;
use crate::math::Aabb;

/// Indexed triangle mesh with coincident vertices welded
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMeshCollider {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
}

impl TriMeshCollider {
    /// Weld a render mesh's vertices by exact position
    pub fn from_mesh(mesh: &ChunkMesh) -> Self {
        let mut lookup: HashMap<[u32; 3], u32> = HashMap::with_capacity(mesh.vertex_count() / 2);
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(mesh.triangle_count());

        let mut weld = |p: Vec3| {
            *lookup.entry(position_key(p)).or_insert_with(|| {
                vertices.push(p);
                (vertices.len() - 1) as u32
            })
        };

        for tri in mesh.triangles() {
            indices.push([weld(tri[0]), weld(tri[1]), weld(tri[2])]);
        }

        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().copied())
    }

    /// Vertex positions of one triangle
    pub fn triangle(&self, i: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = *self.indices.get(i)?;
        Some([
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ])
    }
}
