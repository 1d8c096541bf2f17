//! Chunk identity and per-chunk load/visibility state

use std::sync::Arc;

use crate::mesh::{ChunkMesh, TriMeshCollider};

/// Integer coordinate identifying a chunk in the world grid.
///
/// Valid indices lie in `[0, world_size)` on every axis; see
/// [`WorldLayout::contains`](super::WorldLayout::contains). Signed components
/// keep neighbour arithmetic simple, out-of-range results are filtered by the
/// layout instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkIndex {
    /// Create a new chunk index
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Index shifted by the given per-axis offset
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chebyshev distance (max per-axis absolute difference) in chunks
    /// Saturates at `u32::MAX` for indices at opposite ends of the `i32` range.
    pub fn chebyshev_distance(&self, other: ChunkIndex) -> u32 {
        let axis = |a: i32, b: i32| i64::from(a).abs_diff(i64::from(b));
        let d = axis(self.x, other.x).max(axis(self.y, other.y)).max(axis(self.z, other.z));
        u32::try_from(d).unwrap_or(u32::MAX)
    }
}

impl std::fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Load state of a chunk. Transitions only move forward:
/// `Unloaded -> Generating -> Loaded`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadState {
    #[default]
    Unloaded,
    Generating,
    Loaded,
}

/// One streamable unit of world geometry
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: ChunkIndex,
    state: LoadState,
    mesh: Option<Arc<ChunkMesh>>,
    collider: Option<Arc<TriMeshCollider>>,
    visible: bool,
}

impl Chunk {
    /// Create an unloaded, hidden chunk
    pub fn new(index: ChunkIndex) -> Self {
        Self {
            index,
            state: LoadState::Unloaded,
            mesh: None,
            collider: None,
            visible: false,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Whether the chunk produced geometry. Loaded chunks without a mesh are
    /// empty space and stay empty.
    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.mesh.as_ref()
    }

    pub fn collider(&self) -> Option<&Arc<TriMeshCollider>> {
        self.collider.as_ref()
    }

    /// Mark the chunk as being generated. Returns `false` if it already left
    /// the `Unloaded` state.
    pub(crate) fn begin_generation(&mut self) -> bool {
        if self.state != LoadState::Unloaded {
            return false;
        }
        self.state = LoadState::Generating;
        true
    }

    /// Store the generation result and move to `Loaded`.
    pub(crate) fn finish_generation(
        &mut self,
        geometry: Option<(Arc<ChunkMesh>, Arc<TriMeshCollider>)>,
    ) {
        debug_assert_eq!(self.state, LoadState::Generating);
        if let Some((mesh, collider)) = geometry {
            self.mesh = Some(mesh);
            self.collider = Some(collider);
        }
        self.state = LoadState::Loaded;
    }

    /// Toggle visibility. Only meaningful for loaded chunks with geometry;
    /// returns whether the flag actually changed.
    pub(crate) fn set_visible(&mut self, visible: bool) -> bool {
        if !self.is_loaded() || !self.has_mesh() || self.visible == visible {
            return false;
        }
        self.visible = visible;
        true
    }
}
