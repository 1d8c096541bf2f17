//! Scalar density field derived from the tunnel skeleton.
//!
//! The score of a point is the smallest `|p - s|² - r` over every sample `s`
//! (radius `r`) in the chunk neighbourhood, optionally perturbed by 3D noise.
//! The surface lies where the score crosses the surface threshold.

use glam::Vec3;
use noise::NoiseFn;

use super::config::WorldConfig;
use super::skeleton::Skeleton;
use crate::world::{ChunkIndex, WorldLayout};

/// 3D noise that carves tunnel walls
pub struct HeightNoise {
    func: Box<dyn NoiseFn<f64, 3> + Send + Sync>,
    intensity: f32,
}

impl HeightNoise {
    /// Wrap any 3D noise function
    pub fn new(func: impl NoiseFn<f64, 3> + Send + Sync + 'static, intensity: f32) -> Self {
        Self { func: Box::new(func), intensity }
    }

    /// Noise configured by the world config, if any
    pub fn from_config(config: &WorldConfig) -> Option<Self> {
        config
            .noise
            .as_ref()
            .map(|settings| Self::new(settings.build(config.resolved_seed()), settings.intensity))
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Scaled noise contribution at a point
    pub fn sample(&self, p: Vec3) -> f32 {
        self.func.get([p.x as f64, p.y as f64, p.z as f64]) as f32 * self.intensity
    }
}

impl std::fmt::Debug for HeightNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightNoise")
            .field("func", &"<NoiseFn>")
            .field("intensity", &self.intensity)
            .finish()
    }
}

/// Read-only view over the skeleton answering score queries
pub struct DensityField<'a> {
    skeleton: &'a Skeleton,
    layout: WorldLayout,
    surface_threshold: f32,
    search_radius: i32,
    noise: Option<&'a HeightNoise>,
}

impl<'a> DensityField<'a> {
    pub fn new(
        skeleton: &'a Skeleton,
        layout: WorldLayout,
        surface_threshold: f32,
        noise: Option<&'a HeightNoise>,
    ) -> Self {
        Self {
            skeleton,
            layout,
            surface_threshold,
            search_radius: layout.search_radius(surface_threshold),
            noise,
        }
    }

    pub fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    pub fn surface_threshold(&self) -> f32 {
        self.surface_threshold
    }

    /// Neighbourhood radius in chunks searched for each query
    pub fn search_radius(&self) -> i32 {
        self.search_radius
    }

    /// Whether any sample lies in the neighbourhood of `chunk`. When this is
    /// false every score query for the chunk is `None`.
    pub fn has_samples_near(&self, chunk: ChunkIndex) -> bool {
        self.layout
            .neighbourhood(chunk, self.search_radius)
            .any(|i| !self.skeleton.bucket(i).is_empty())
    }

    /// Score of `point`, searching the buckets around `chunk`.
    ///
    /// `None` when no sample is in range. Noise may lower a score but never
    /// raises it above the raw squared distance.
    pub fn score(&self, point: Vec3, chunk: ChunkIndex) -> Option<f32> {
        let noise = self.noise.map(|n| n.sample(point));
        let mut best: Option<f32> = None;

        for index in self.layout.neighbourhood(chunk, self.search_radius) {
            for sample in self.skeleton.bucket(index) {
                let dist_sq = point.distance_squared(sample.position);
                let mut value = dist_sq - sample.radius;
                if let Some(n) = noise {
                    value = (value + n).min(dist_sq);
                }
                best = Some(best.map_or(value, |b| b.min(value)));
            }
        }

        best
    }
}
