//! World generation configuration.
//!
//! Loaded once at world start and read-only afterwards. Stored as JSON so a
//! world can be regenerated from the same file.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use noise::{Fbm, MultiFractal, Perlin};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::math::Aabb;
use crate::world::WorldLayout;

/// Parameters for the optional 3D noise that carves tunnel walls
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Multiplier applied to the raw noise value before it is added to a score
    pub intensity: f32,
    /// Spatial frequency (noise is sampled at `position * frequency`)
    pub frequency: f32,
    /// FBM octaves
    pub octaves: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            frequency: 0.15,
            octaves: 3,
        }
    }
}

impl NoiseSettings {
    /// Build the FBM noise function for a world seed
    pub fn build(&self, seed: u64) -> Fbm<Perlin> {
        Fbm::<Perlin>::new((seed ^ (seed >> 32)) as u32)
            .set_octaves(self.octaves.max(1) as usize)
            .set_frequency(self.frequency as f64)
    }
}

/// Immutable generation parameters for one world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Random seed. 0 = derive one from the wall clock at world start.
    pub seed: u64,
    /// Chunks per world axis
    pub world_size: u32,
    /// Grid cells per chunk axis
    pub chunk_size: u32,
    /// Edge length of one grid cell
    pub cell_size: f32,
    /// Start point of the first tunnel
    pub tunnel_origin: Vec3,
    /// Max per-axis offset between a tunnel's endpoints (and of the control
    /// point from the endpoints' midpoint)
    pub tunnel_range: f32,
    /// Number of tunnel segments
    pub tunnel_count: u32,
    /// Centerline samples taken per tunnel segment
    pub samples_per_curve: u32,
    /// Score below which a grid point counts as inside a tunnel
    pub surface_threshold: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Chebyshev radius, in chunks, kept generated and visible around the focus
    pub render_distance: u32,
    /// Probability in [0, 1] of taking the front of the branch queue on each
    /// draw. Lower values make deeper, more uneven branching.
    pub branchiness: f32,
    /// Share normals between triangles meeting at the same vertex
    pub smooth_normals: bool,
    /// Drop zero-area triangles instead of emitting them with a zero normal
    pub cull_degenerate: bool,
    /// Optional wall perturbation
    pub noise: Option<NoiseSettings>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            world_size: 10,
            chunk_size: 10,
            cell_size: 1.0,
            tunnel_origin: Vec3::ZERO,
            tunnel_range: 10.0,
            tunnel_count: 10,
            samples_per_curve: 10,
            surface_threshold: 5.0,
            min_radius: 1.0,
            max_radius: 4.0,
            render_distance: 3,
            branchiness: 0.5,
            smooth_normals: true,
            cull_degenerate: false,
            noise: None,
        }
    }
}

impl WorldConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write this config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// World geometry implied by this config
    pub fn layout(&self) -> WorldLayout {
        WorldLayout::new(self.world_size, self.chunk_size, self.cell_size)
    }

    /// Clearance kept between tunnel control points and the world boundary
    pub fn safety_margin(&self) -> f32 {
        2.0 * self.surface_threshold
    }

    /// Region every curve point must be drawn from: the world bounds shrunk
    /// by the safety margin on every side
    pub fn sampling_bounds(&self) -> Aabb {
        self.layout().world_bounds().inflated(-self.safety_margin())
    }

    /// The seed actually used for generation
    pub fn resolved_seed(&self) -> u64 {
        if self.seed != 0 {
            return self.seed;
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        nanos.max(1)
    }

    /// Copy of this config with the seed fixed, so later calls to
    /// [`resolved_seed`](Self::resolved_seed) are stable
    pub fn with_resolved_seed(&self) -> Self {
        Self { seed: self.resolved_seed(), ..self.clone() }
    }

    /// Check that the configuration can produce a world
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Config(msg));

        if self.world_size == 0 {
            return fail("world_size must be at least 1".into());
        }
        if self.chunk_size == 0 {
            return fail("chunk_size must be at least 1".into());
        }
        if !(self.cell_size > 0.0) {
            return fail(format!("cell_size must be positive, got {}", self.cell_size));
        }
        if self.tunnel_count == 0 {
            return fail("tunnel_count must be at least 1".into());
        }
        if self.samples_per_curve == 0 {
            return fail("samples_per_curve must be at least 1".into());
        }
        if !(self.surface_threshold > 0.0) {
            return fail(format!("surface_threshold must be positive, got {}", self.surface_threshold));
        }
        if !(self.tunnel_range >= 0.0) {
            return fail(format!("tunnel_range must not be negative, got {}", self.tunnel_range));
        }
        if !(self.min_radius >= 0.0 && self.min_radius <= self.max_radius) {
            return fail(format!(
                "radius range [{}, {}] is invalid",
                self.min_radius, self.max_radius
            ));
        }
        if !(0.0..=1.0).contains(&self.branchiness) {
            return fail(format!("branchiness must be in [0, 1], got {}", self.branchiness));
        }
        if self.render_distance == 0 {
            return fail("render_distance must be at least 1".into());
        }

        let bounds = self.sampling_bounds();
        if !bounds.is_valid() {
            return fail(format!(
                "world of {} units leaves no room for tunnels with a {} unit safety margin",
                self.layout().half_width() * 2.0,
                self.safety_margin()
            ));
        }
        if !bounds.contains_point(self.tunnel_origin) {
            return fail(format!(
                "tunnel_origin {} lies outside the sampling bounds {:?}",
                self.tunnel_origin, bounds
            ));
        }

        if let Some(noise) = &self.noise {
            if !noise.intensity.is_finite() || !noise.frequency.is_finite() {
                return fail("noise settings must be finite".into());
            }
        }

        Ok(())
    }
}
