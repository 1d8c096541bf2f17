//! Deferred scene-graph mutations.
//!
//! Chunk generation never touches the host's scene directly. It records
//! commands in a [`SceneQueue`] which the host drains on its own thread.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::mesh::{ChunkMesh, TriMeshCollider};
use crate::world::ChunkIndex;

/// One pending change to the host scene
#[derive(Clone, Debug)]
pub enum SceneCommand {
    /// Add a freshly generated chunk's render mesh and collision volume.
    /// The node starts hidden.
    Attach {
        index: ChunkIndex,
        mesh: Arc<ChunkMesh>,
        collider: Arc<TriMeshCollider>,
    },
    Show(ChunkIndex),
    Hide(ChunkIndex),
}

impl SceneCommand {
    /// Chunk the command applies to
    pub fn index(&self) -> ChunkIndex {
        match self {
            SceneCommand::Attach { index, .. } => *index,
            SceneCommand::Show(index) | SceneCommand::Hide(index) => *index,
        }
    }
}

/// Receiver of scene commands, implemented by the rendering/physics host
pub trait SceneSink {
    fn attach(&mut self, index: ChunkIndex, mesh: Arc<ChunkMesh>, collider: Arc<TriMeshCollider>);
    fn set_visible(&mut self, index: ChunkIndex, visible: bool);

    /// Dispatch one command to the matching method
    fn apply(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::Attach { index, mesh, collider } => self.attach(index, mesh, collider),
            SceneCommand::Show(index) => self.set_visible(index, true),
            SceneCommand::Hide(index) => self.set_visible(index, false),
        }
    }
}

/// FIFO of scene commands awaiting the host
#[derive(Debug, Default)]
pub struct SceneQueue {
    pending: VecDeque<SceneCommand>,
}

impl SceneQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: SceneCommand) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every pending command in submission order
    pub fn drain(&mut self) -> Vec<SceneCommand> {
        self.pending.drain(..).collect()
    }

    /// Apply every pending command to `sink`. Returns how many were applied.
    pub fn flush_into(&mut self, sink: &mut impl SceneSink) -> usize {
        let count = self.pending.len();
        while let Some(command) = self.pending.pop_front() {
            sink.apply(command);
        }
        count
    }
}
