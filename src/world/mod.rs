//! World-space layout: chunk indices, index/position conversion and
//! per-chunk streaming state

pub mod chunk;
pub mod layout;

pub use chunk::{Chunk, ChunkIndex, LoadState};
pub use layout::WorldLayout;
