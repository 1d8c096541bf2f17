//! Chunk streaming around a moving focus, deferred scene updates and world
//! persistence

pub mod disk_io;
pub mod scene;
pub mod streamer;

pub use disk_io::{
    SavedWorld,
    encode_world, decode_world,
    compress_world, decompress_world,
    save_world, load_world, save_world_sync, load_world_sync,
    world_path,
};
pub use scene::{SceneCommand, SceneQueue, SceneSink};
pub use streamer::{ChunkStreamer, StreamerStats};
