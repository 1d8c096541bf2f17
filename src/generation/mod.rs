//! World generation: random tunnel network, centerline sampling and the
//! density field derived from it.
//!
//! The pipeline runs once per world:
//! 1. `CurveNetworkGenerator` draws a branching set of Bezier curves
//! 2. `CurveSampler` walks every curve and buckets samples by chunk
//! 3. `DensityField` answers score queries against the resulting `Skeleton`

pub mod config;
pub mod curves;
pub mod density;
pub mod rng;
pub mod sampler;
pub mod skeleton;

pub use config::{NoiseSettings, WorldConfig};
pub use curves::{Curve, CurveNetworkGenerator};
pub use density::{DensityField, HeightNoise};
pub use rng::RandomSequence;
pub use sampler::CurveSampler;
pub use skeleton::{CurveSample, Skeleton};

use crate::core::Result;

/// Generate the tunnel network for a config and sample it into a skeleton.
///
/// The config should already carry a resolved seed (see
/// [`WorldConfig::with_resolved_seed`]); a zero seed is resolved here and
/// logged, but a second call would then produce a different world.
pub fn build_skeleton(config: &WorldConfig) -> Result<Skeleton> {
    config.validate()?;

    let seed = config.resolved_seed();
    if config.seed == 0 {
        log::warn!("build_skeleton called with seed 0, using wall-clock seed {}", seed);
    }

    let layout = config.layout();
    let (curves, rng) = CurveNetworkGenerator::new(config).generate(RandomSequence::new(seed))?;
    let skeleton = CurveSampler::new(config.samples_per_curve, &layout).sample_all(&curves);

    log::info!(
        "Built skeleton: seed {}, {} curves, {} samples in {} chunks ({} draws)",
        seed,
        curves.len(),
        skeleton.sample_count(),
        skeleton.occupied_chunks(),
        rng.draws()
    );

    Ok(skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn config() -> WorldConfig {
        WorldConfig {
            seed: 7,
            world_size: 6,
            chunk_size: 4,
            tunnel_range: 6.0,
            tunnel_count: 5,
            samples_per_curve: 8,
            surface_threshold: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_skeleton_counts() {
        let skeleton = build_skeleton(&config()).unwrap();
        assert_eq!(skeleton.sample_count(), 5 * 8);
        assert!(skeleton.occupied_chunks() >= 1);
    }

    #[test]
    fn test_build_skeleton_deterministic() {
        let a = build_skeleton(&config()).unwrap();
        let b = build_skeleton(&config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_sample_is_tunnel_origin() {
        let cfg = WorldConfig { tunnel_origin: Vec3::new(1.0, -2.0, 0.5), ..config() };
        let skeleton = build_skeleton(&cfg).unwrap();
        let origin_chunk = cfg.layout().chunk_to_index(cfg.tunnel_origin);
        assert!(skeleton
            .bucket(origin_chunk)
            .iter()
            .any(|s| s.position == cfg.tunnel_origin));
    }

    #[test]
    fn test_build_skeleton_rejects_invalid_config() {
        let cfg = WorldConfig { tunnel_count: 0, ..config() };
        assert!(build_skeleton(&cfg).is_err());
    }
}
