//! World skeleton serialization and disk I/O.
//!
//! Only the bucketed tunnel skeleton is stored; grids and meshes are
//! regenerated from it. Text layout before compression:
//!
//! ```text
//! <world name>
//! <size> <size> <size>
//! #<x> <y> <z>
//! <px> <py> <pz> <radius>
//! ...
//! ```
//!
//! Buckets are written in index order. The whole payload is LZ4 compressed
//! with its length prepended.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glam::Vec3;

use crate::core::{Error, Result};
use crate::generation::{CurveSample, Skeleton};
use crate::world::{ChunkIndex, WorldLayout};

/// File extension of saved worlds
pub const WORLD_EXTENSION: &str = "tgm";

/// Everything needed to restore a world besides its config
#[derive(Clone, Debug, PartialEq)]
pub struct SavedWorld {
    pub name: String,
    /// Chunks per world axis
    pub world_size: u32,
    pub skeleton: Skeleton,
}

impl SavedWorld {
    pub fn new(name: impl Into<String>, world_size: u32, skeleton: Skeleton) -> Self {
        Self { name: name.into(), world_size, skeleton }
    }

    /// Check that every sample lies in the chunk it is bucketed under,
    /// clamping out-of-world positions the way sampling does.
    pub fn validate(&self, layout: &WorldLayout) -> Result<()> {
        if self.world_size != layout.world_size {
            return Err(Error::Persistence(format!(
                "world '{}' was saved with size {} but the layout has {}",
                self.name,
                self.world_size,
                layout.world_size
            )));
        }
        for (index, samples) in self.skeleton.buckets() {
            for sample in samples {
                let expected = layout.clamp(layout.chunk_to_index(sample.position));
                if expected != index {
                    return Err(Error::Persistence(format!(
                        "sample at {} is stored under chunk {} but belongs to {}",
                        sample.position, index, expected
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Serialize a world to its text form (uncompressed)
pub fn encode_world(world: &SavedWorld) -> Result<String> {
    if world.name.is_empty() || world.name.contains(['\n', '\r']) {
        return Err(Error::Persistence(format!("invalid world name {:?}", world.name)));
    }

    let mut out = String::with_capacity(64 + world.skeleton.sample_count() * 32);
    let size = world.world_size;
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", world.name);
    let _ = writeln!(out, "{} {} {}", size, size, size);
    for (index, samples) in world.skeleton.buckets() {
        let _ = writeln!(out, "#{} {} {}", index.x, index.y, index.z);
        for s in samples {
            let p = s.position;
            let _ = writeln!(out, "{} {} {} {}", p.x, p.y, p.z, s.radius);
        }
    }
    Ok(out)
}

/// Parse the text form produced by [`encode_world`]
pub fn decode_world(text: &str) -> Result<SavedWorld> {
    let mut lines = text.lines().enumerate();

    let name = match lines.next() {
        Some((_, name)) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::Persistence("missing world name".into())),
    };

    let (_, size_line) = lines
        .next()
        .ok_or_else(|| Error::Persistence("missing world size".into()))?;
    let [sx, sy, sz] = parse_fields::<u32, 3>(size_line, 2)?;
    if sx != sy || sy != sz || sx == 0 {
        return Err(Error::Persistence(format!(
            "unsupported world size {} {} {}",
            sx, sy, sz
        )));
    }
    let world_size = sx;

    let mut skeleton = Skeleton::new();
    let mut current: Option<ChunkIndex> = None;

    for (n, line) in lines {
        let line_no = n + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(marker) = line.strip_prefix('#') {
            let [x, y, z] = parse_fields::<i32, 3>(marker, line_no)?;
            let index = ChunkIndex::new(x, y, z);
            let size = world_size as i32;
            if ![x, y, z].iter().all(|c| (0..size).contains(c)) {
                return Err(Error::Persistence(format!(
                    "line {}: chunk {} outside a world of size {}",
                    line_no, index, world_size
                )));
            }
            current = Some(index);
        } else {
            let index = current.ok_or_else(|| {
                Error::Persistence(format!("line {}: sample before any chunk marker", line_no))
            })?;
            let [x, y, z, radius] = parse_fields::<f32, 4>(line, line_no)?;
            skeleton.insert(index, CurveSample::new(Vec3::new(x, y, z), radius));
        }
    }

    Ok(SavedWorld { name, world_size, skeleton })
}

/// Parse exactly `N` whitespace-separated values
fn parse_fields<T: FromStr, const N: usize>(line: &str, line_no: usize) -> Result<[T; N]> {
    let values: Vec<T> = line
        .split_whitespace()
        .map(|field| {
            field.parse::<T>().map_err(|_| {
                Error::Persistence(format!("line {}: cannot parse {:?}", line_no, field))
            })
        })
        .collect::<Result<_>>()?;

    <[T; N]>::try_from(values).map_err(|v| {
        Error::Persistence(format!(
            "line {}: expected {} values, found {}",
            line_no,
            N,
            v.len()
        ))
    })
}

/// Encode and LZ4-compress a world
pub fn compress_world(world: &SavedWorld) -> Result<Vec<u8>> {
    let text = encode_world(world)?;
    Ok(lz4_flex::compress_prepend_size(text.as_bytes()))
}

/// Decompress and decode a world
pub fn decompress_world(data: &[u8]) -> Result<SavedWorld> {
    let bytes = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| Error::Persistence(format!("LZ4 decompression failed: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::Persistence(format!("world file is not UTF-8: {}", e)))?;
    decode_world(&text)
}

/// File path of a named world in a directory
pub fn world_path(base_dir: &Path, name: &str) -> PathBuf {
    base_dir.join(format!("{}.{}", name, WORLD_EXTENSION))
}

/// Save a world to `base_dir`, returning the written path
pub fn save_world_sync(base_dir: &Path, world: &SavedWorld) -> Result<PathBuf> {
    let path = world_path(base_dir, &world.name);
    std::fs::create_dir_all(base_dir)?;
    let compressed = compress_world(world)?;
    std::fs::write(&path, &compressed)?;
    log::info!(
        "Saved world '{}' ({} samples, {} bytes) to {}",
        world.name,
        world.skeleton.sample_count(),
        compressed.len(),
        path.display()
    );
    Ok(path)
}

/// Load a world file
pub fn load_world_sync(path: &Path) -> Result<SavedWorld> {
    let data = std::fs::read(path)?;
    let world = decompress_world(&data)?;
    log::info!(
        "Loaded world '{}' ({} samples) from {}",
        world.name,
        world.skeleton.sample_count(),
        path.display()
    );
    Ok(world)
}

/// Save a world to `base_dir` without blocking the runtime
pub async fn save_world(base_dir: &Path, world: &SavedWorld) -> Result<PathBuf> {
    let path = world_path(base_dir, &world.name);
    tokio::fs::create_dir_all(base_dir).await?;
    let compressed = compress_world(world)?;
    tokio::fs::write(&path, compressed).await?;
    log::info!("Saved world '{}' to {}", world.name, path.display());
    Ok(path)
}

/// Load a world file without blocking the runtime
pub async fn load_world(path: &Path) -> Result<SavedWorld> {
    let data = tokio::fs::read(path).await?;
    let world = decompress_world(&data)?;
    log::info!("Loaded world '{}' from {}", world.name, path.display());
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_world() -> SavedWorld {
        let mut skeleton = Skeleton::new();
        skeleton.insert(ChunkIndex::new(2, 2, 2), CurveSample::new(Vec3::new(0.0, 0.0, 0.0), 1.5));
        skeleton.insert(ChunkIndex::new(2, 2, 2), CurveSample::new(Vec3::new(0.1, 0.2, 3.75), 2.0));
        skeleton.insert(ChunkIndex::new(0, 1, 3), CurveSample::new(Vec3::new(-7.3, -3.9, 5.5), 1.0 / 3.0));
        SavedWorld::new("caves", 4, skeleton)
    }

    #[test]
    fn test_text_layout() {
        let text = encode_world(&sample_world()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "caves");
        assert_eq!(lines[1], "4 4 4");
        // Buckets in index order
        assert_eq!(lines[2], "#0 1 3");
        assert_eq!(lines[4], "#2 2 2");
        assert_eq!(lines[5], "0 0 0 1.5");
        assert_eq!(lines[6], "0.1 0.2 3.75 2");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_decode_restores_exact_values() {
        let world = sample_world();
        let decoded = decode_world(&encode_world(&world).unwrap()).unwrap();
        assert_eq!(decoded, world);
        assert_eq!(decoded.skeleton.bucket(ChunkIndex::new(0, 1, 3))[0].radius, 1.0 / 3.0);
    }

    #[test]
    fn test_validate_checks_bucket_membership() {
        let layout = WorldLayout::new(4, 4, 1.0);
        let mut world = sample_world();
        assert!(world.validate(&layout).is_ok());

        // The origin belongs to chunk (2, 2, 2)
        world.skeleton.insert(ChunkIndex::new(0, 1, 3), CurveSample::new(Vec3::ZERO, 1.0));
        assert!(matches!(world.validate(&layout), Err(Error::Persistence(_))));
    }

    #[test]
    fn test_validate_clamps_outside_positions() {
        let layout = WorldLayout::new(4, 4, 1.0);
        let mut skeleton = Skeleton::new();
        skeleton.insert(ChunkIndex::new(3, 0, 3), CurveSample::new(Vec3::new(100.0, -100.0, 9.0), 1.0));
        let world = SavedWorld::new("edge", 4, skeleton);
        assert!(world.validate(&layout).is_ok());
        assert!(world.validate(&WorldLayout::new(6, 4, 1.0)).is_err());
    }

    #[test]
    fn test_compressed_blob() {
        let world = sample_world();
        let blob = compress_world(&world).unwrap();
        assert_eq!(decompress_world(&blob).unwrap(), world);
    }

    #[test]
    fn test_rejects_bad_name() {
        let mut world = sample_world();
        world.name = "two\nlines".into();
        assert!(matches!(encode_world(&world), Err(Error::Persistence(_))));
        world.name.clear();
        assert!(encode_world(&world).is_err());
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode_world("").is_err());
        assert!(decode_world("name\n4 4").is_err());
        assert!(decode_world("name\n4 5 4\n").is_err());
        assert!(decode_world("name\n4 4 4\n1 2 3 4\n").is_err());
        assert!(decode_world("name\n4 4 4\n#0 0 9\n").is_err());
        assert!(decode_world("name\n4 4 4\n#0 0 0\n1 2 x 4\n").is_err());
        assert!(decode_world("name\n4 4 4\n#0 0 0\n1 2 3\n").is_err());

        let empty = decode_world("name\n4 4 4\n").unwrap();
        assert!(empty.skeleton.is_empty());
    }

    #[test]
    fn test_corrupt_blob_is_an_error() {
        let mut blob = compress_world(&sample_world()).unwrap();
        blob.truncate(blob.len() / 2);
        assert!(matches!(decompress_world(&blob), Err(Error::Persistence(_))));
        assert!(decompress_world(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_world_path() {
        let path = world_path(Path::new("/tmp/worlds"), "caves");
        assert_eq!(path, PathBuf::from("/tmp/worlds/caves.tgm"));
    }

    #[test]
    fn test_save_and_load_sync() {
        let dir = TempDir::new().unwrap();
        let world = sample_world();
        let path = save_world_sync(&dir.path().join("nested"), &world).unwrap();
        assert!(path.exists());
        assert_eq!(load_world_sync(&path).unwrap(), world);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_world_sync(&dir.path().join("missing.tgm"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_save_and_load_async() {
        let dir = TempDir::new().unwrap();
        let world = sample_world();
        let path = save_world(dir.path(), &world).await.unwrap();
        assert_eq!(load_world(&path).await.unwrap(), world);
    }
}
