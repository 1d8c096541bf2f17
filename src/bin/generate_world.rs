//! World baker - builds a tunnel skeleton, saves it, and meshes every chunk.
//!
//! Usage: cargo run --release --bin generate_world -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   JSON world config (default: built-in defaults)
//!   --seed <SEED>     Random seed, 0 = wall clock (overrides config)
//!   --size <CHUNKS>   Chunks per world axis (overrides config)
//!   --tunnels <N>     Number of tunnel segments (overrides config)
//!   --name <NAME>     World name (default: "caves")
//!   --out <DIR>       Output directory (default: "assets/worlds")
//!   --jobs <N>        Max parallel chunk builds (default: all cores)
//!
//! Output:
//!   <out>/<name>.tgm            # Compressed tunnel skeleton
//!   <out>/<name>.json           # Resolved config (reproduces the world)
//!   <out>/<name>.manifest.json  # Per-chunk mesh statistics

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde_json::json;

use delve::generation::{self, DensityField, HeightNoise, WorldConfig};
use delve::mesh::{self, MeshOptions, SurfaceExtractor, TriMeshCollider};
use delve::streaming::{SavedWorld, disk_io};
use delve::world::ChunkIndex;

fn main() {
    delve::core::logging::init_with_timestamps();

    let args: Vec<String> = std::env::args().collect();
    let name = parse_str_arg(&args, "--name").unwrap_or_else(|| "caves".to_string());
    let output_dir = PathBuf::from(parse_str_arg(&args, "--out").unwrap_or_else(|| "assets/worlds".to_string()));
    let jobs = parse_usize_arg(&args, "--jobs")
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4));

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => WorldConfig::load(&path).expect("Failed to load world config"),
        None => WorldConfig::default(),
    };
    if let Some(seed) = parse_u64_arg(&args, "--seed") {
        config.seed = seed;
    }
    if let Some(size) = parse_u32_arg(&args, "--size") {
        config.world_size = size;
    }
    if let Some(tunnels) = parse_u32_arg(&args, "--tunnels") {
        config.tunnel_count = tunnels;
    }
    let config = config.with_resolved_seed();

    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .expect("Failed to configure thread pool");

    let layout = config.layout();

    println!("=== Delve World Baker ===");
    println!("World:   {}", name);
    println!("Size:    {}^3 chunks of {}^3 cells ({} units)", config.world_size, config.chunk_size, layout.half_width() * 2.0);
    println!("Seed:    {}", config.seed);
    println!("Tunnels: {} x {} samples", config.tunnel_count, config.samples_per_curve);
    println!("Jobs:    {} parallel", jobs);
    println!("Output:  {}", output_dir.display());
    println!();

    // Phase 1: skeleton
    let start = Instant::now();
    let skeleton = generation::build_skeleton(&config).expect("Failed to build tunnel skeleton");
    println!(
        "Skeleton: {} samples in {} chunks ({:.1} ms)",
        skeleton.sample_count(),
        skeleton.occupied_chunks(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let saved = SavedWorld::new(name.clone(), config.world_size, skeleton);
    let world_file = disk_io::save_world_sync(&output_dir, &saved).expect("Failed to save world");
    let config_file = output_dir.join(format!("{}.json", name));
    config.save(&config_file).expect("Failed to save world config");

    // Phase 2: mesh every chunk against the shared skeleton
    let noise = HeightNoise::from_config(&config);
    let field = DensityField::new(&saved.skeleton, layout, config.surface_threshold, noise.as_ref());
    let extractor = SurfaceExtractor::new(MeshOptions::from_config(&config));

    let indices: Vec<ChunkIndex> = layout.indices().collect();
    let total = indices.len();
    let done = AtomicUsize::new(0);
    let start = Instant::now();

    let meshed: Vec<(ChunkIndex, usize, usize)> = indices
        .par_iter()
        .filter_map(|&index| {
            let result = mesh::build_chunk_mesh(&field, &extractor, index).map(|mesh| {
                let collider = TriMeshCollider::from_mesh(&mesh);
                (index, mesh.triangle_count(), collider.vertices.len())
            });

            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % 100 == 0 || n == total {
                let rate = n as f64 / start.elapsed().as_secs_f64();
                eprintln!("  [{}/{}] {:.0} chunks/sec", n, total, rate);
            }

            result
        })
        .collect();

    let elapsed = start.elapsed();
    let triangles: usize = meshed.iter().map(|&(_, t, _)| t).sum();

    // Phase 3: manifest
    let manifest = json!({
        "name": name,
        "seed": config.seed,
        "world_size": config.world_size,
        "chunk_size": config.chunk_size,
        "cell_size": config.cell_size,
        "samples": saved.skeleton.sample_count(),
        "chunk_count": meshed.len(),
        "triangles": triangles,
        "chunks": meshed.iter().map(|(index, tris, verts)| {
            json!({"x": index.x, "y": index.y, "z": index.z, "triangles": tris, "collider_vertices": verts})
        }).collect::<Vec<_>>(),
    });
    let manifest_path = output_dir.join(format!("{}.manifest.json", name));
    let manifest_text = serde_json::to_string_pretty(&manifest).expect("Failed to serialize manifest");
    std::fs::write(&manifest_path, manifest_text).expect("Failed to write manifest");

    println!();
    println!("=== Bake Complete ===");
    println!(
        "Chunks:    {} with geometry (of {}) in {:.1}s",
        meshed.len(),
        total,
        elapsed.as_secs_f64()
    );
    println!("Triangles: {}", triangles);
    println!("World:     {}", world_file.display());
    println!("Config:    {}", config_file.display());
    println!("Manifest:  {}", manifest_path.display());
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
