//! Focus-driven chunk streaming.
//!
//! The streamer owns one [`Chunk`] slot per world chunk and keeps the cube
//! of chunks within `render_distance` (Chebyshev) of the focus generated and
//! visible. Chunks are generated lazily the first time they enter range and
//! never unloaded; leaving range only hides them. Scene changes are queued
//! as [`SceneCommand`]s for the host to apply.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;

use super::disk_io::{self, SavedWorld};
use super::scene::{SceneCommand, SceneQueue};
use crate::core::Result;
use crate::generation::{self, DensityField, HeightNoise, Skeleton, WorldConfig};
use crate::mesh::{self, MeshOptions, SurfaceExtractor, TriMeshCollider};
use crate::world::{Chunk, ChunkIndex, LoadState, WorldLayout};

/// Running totals since the streamer was created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Chunks that went through generation
    pub generated: usize,
    /// Generated chunks that turned out empty
    pub empty: usize,
    /// Show commands issued
    pub shown: usize,
    /// Hide commands issued
    pub hidden: usize,
}

pub struct ChunkStreamer {
    config: WorldConfig,
    layout: WorldLayout,
    skeleton: Arc<Skeleton>,
    noise: Option<HeightNoise>,
    extractor: SurfaceExtractor,
    /// Indexed by `WorldLayout::linear`
    chunks: Vec<Chunk>,
    /// Chunks currently visible
    active: Vec<ChunkIndex>,
    scene: SceneQueue,
    stats: StreamerStats,
}

impl ChunkStreamer {
    /// Generate a new world from a config. A zero seed is resolved first so
    /// the streamer's config reproduces the world.
    pub fn new(config: &WorldConfig) -> Result<Self> {
        let config = config.with_resolved_seed();
        let skeleton = generation::build_skeleton(&config)?;
        Ok(Self::with_skeleton(config, skeleton))
    }

    /// Restore a world from a saved skeleton. The config must describe the
    /// same world size the file was saved with, and every sample must sit in
    /// the chunk the config's layout maps it to.
    pub fn from_saved(config: &WorldConfig, saved: SavedWorld) -> Result<Self> {
        config.validate()?;
        saved.validate(&config.layout())?;
        log::info!(
            "Restoring world '{}' with {} samples",
            saved.name,
            saved.skeleton.sample_count()
        );
        Ok(Self::with_skeleton(config.with_resolved_seed(), saved.skeleton))
    }

    fn with_skeleton(config: WorldConfig, skeleton: Skeleton) -> Self {
        let layout = config.layout();
        let chunks = (0..layout.chunk_count())
            .map(|slot| Chunk::new(layout.from_linear(slot)))
            .collect();

        Self {
            noise: HeightNoise::from_config(&config),
            extractor: SurfaceExtractor::new(MeshOptions::from_config(&config)),
            layout,
            skeleton: Arc::new(skeleton),
            chunks,
            active: Vec::new(),
            scene: SceneQueue::new(),
            stats: StreamerStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    /// Shared read-only skeleton
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    pub fn stats(&self) -> StreamerStats {
        self.stats
    }

    pub fn chunk(&self, index: ChunkIndex) -> Option<&Chunk> {
        self.layout.linear(index).map(|slot| &self.chunks[slot])
    }

    /// Chunks currently visible
    pub fn active_chunks(&self) -> &[ChunkIndex] {
        &self.active
    }

    pub fn scene_queue(&self) -> &SceneQueue {
        &self.scene
    }

    pub fn scene_queue_mut(&mut self) -> &mut SceneQueue {
        &mut self.scene
    }

    /// Density field over this world's skeleton
    pub fn field(&self) -> DensityField<'_> {
        DensityField::new(
            &self.skeleton,
            self.layout,
            self.config.surface_threshold,
            self.noise.as_ref(),
        )
    }

    /// First refresh, focused on the tunnel origin
    pub fn start(&mut self) {
        self.refresh(self.config.tunnel_origin);
    }

    /// Bring the chunks around `focus` into view and hide those that left
    /// range. Calling it again with a focus in the same chunk does nothing.
    pub fn refresh(&mut self, focus: Vec3) {
        let center = self.layout.chunk_to_index(focus);
        let render_distance = self.config.render_distance;
        let before = self.stats;

        for index in self.active.iter().copied() {
            if index.chebyshev_distance(center) < render_distance {
                continue;
            }
            if let Some(slot) = self.layout.linear(index) {
                if self.chunks[slot].set_visible(false) {
                    log::trace!("Hiding chunk {}", index);
                    self.scene.push(SceneCommand::Hide(index));
                    self.stats.hidden += 1;
                }
            }
        }

        let layout = self.layout;
        let reach = render_distance as i32 - 1;
        for index in layout.neighbourhood(center, reach) {
            let Some(slot) = layout.linear(index) else { continue };
            match self.chunks[slot].state() {
                LoadState::Unloaded => {
                    self.generate_chunk(index);
                }
                LoadState::Generating => continue,
                LoadState::Loaded => {}
            }
            if self.chunks[slot].set_visible(true) {
                log::trace!("Showing chunk {}", index);
                self.scene.push(SceneCommand::Show(index));
                self.stats.shown += 1;
                self.active.push(index);
            }
        }

        let chunks = &self.chunks;
        self.active.retain(|&index| {
            layout
                .linear(index)
                .is_some_and(|slot| chunks[slot].has_mesh() && chunks[slot].is_visible())
        });

        log::debug!(
            "Refresh at chunk {}: {} generated, {} shown, {} hidden, {} active",
            center,
            self.stats.generated - before.generated,
            self.stats.shown - before.shown,
            self.stats.hidden - before.hidden,
            self.active.len()
        );
    }

    /// Generate a chunk if it is still unloaded. Returns whether the chunk
    /// has geometry. A new mesh is queued for attachment, hidden.
    pub fn generate_chunk(&mut self, index: ChunkIndex) -> bool {
        let Some(slot) = self.layout.linear(index) else {
            return false;
        };
        if !self.chunks[slot].begin_generation() {
            return self.chunks[slot].has_mesh();
        }

        let built = {
            let field = self.field();
            mesh::build_chunk_mesh(&field, &self.extractor, index)
        };
        let geometry = built.map(|mesh| {
            let collider = TriMeshCollider::from_mesh(&mesh);
            (Arc::new(mesh), Arc::new(collider))
        });

        self.stats.generated += 1;
        match &geometry {
            Some((mesh, collider)) => {
                log::debug!("Generated chunk {}: {} triangles", index, mesh.triangle_count());
                self.scene.push(SceneCommand::Attach {
                    index,
                    mesh: Arc::clone(mesh),
                    collider: Arc::clone(collider),
                });
            }
            None => {
                log::debug!("Chunk {} is empty", index);
                self.stats.empty += 1;
            }
        }

        let has_mesh = geometry.is_some();
        self.chunks[slot].finish_generation(geometry);
        has_mesh
    }

    /// Snapshot of the persistent world state
    pub fn saved_world(&self, name: impl Into<String>) -> SavedWorld {
        SavedWorld::new(name, self.config.world_size, (*self.skeleton).clone())
    }

    /// Save the skeleton to `base_dir/<name>.tgm`
    pub fn save(&self, base_dir: &Path, name: &str) -> Result<PathBuf> {
        disk_io::save_world_sync(base_dir, &self.saved_world(name))
    }
}
