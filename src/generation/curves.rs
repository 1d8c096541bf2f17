//! Branching tunnel network built from quadratic Bezier segments.
//!
//! The first segment starts at the configured tunnel origin. Every later
//! segment starts at a branch point taken from a FIFO queue of earlier
//! endpoints: the queue is rotated while draws exceed `branchiness`, then the
//! front entry is used. Endpoints and control points are drawn by rejection
//! sampling so every point stays inside the world minus the safety margin.

use std::collections::VecDeque;

use glam::Vec3;

use super::config::WorldConfig;
use super::rng::RandomSequence;
use crate::core::{Error, Result};
use crate::math::Aabb;

/// Upper bound on redraws for a single coordinate before the configuration
/// is declared unsatisfiable
pub const MAX_REJECTION_DRAWS: u32 = 1024;

/// Upper bound on queue rotations while picking a branch point. After this
/// many rejections the current front is used.
pub const MAX_BRANCH_ROTATIONS: u32 = 1024;

/// One tunnel segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Curve {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
    pub start_radius: f32,
    pub end_radius: f32,
}

impl Curve {
    /// Quadratic Bezier position at `t` in [0, 1]
    pub fn point_at(&self, t: f32) -> Vec3 {
        let q0 = self.start.lerp(self.control, t);
        let q1 = self.control.lerp(self.end, t);
        q0.lerp(q1, t)
    }

    /// Radius linearly interpolated between the endpoints
    pub fn radius_at(&self, t: f32) -> f32 {
        self.start_radius + (self.end_radius - self.start_radius) * t
    }
}

/// Synthesizes the tunnel skeleton's curves
pub struct CurveNetworkGenerator<'a> {
    config: &'a WorldConfig,
    bounds: Aabb,
}

impl<'a> CurveNetworkGenerator<'a> {
    pub fn new(config: &'a WorldConfig) -> Self {
        Self {
            config,
            bounds: config.sampling_bounds(),
        }
    }

    /// Build `tunnel_count` curves. Returns the curves and the advanced
    /// random sequence.
    pub fn generate(&self, rng: RandomSequence) -> Result<(Vec<Curve>, RandomSequence)> {
        let count = self.config.tunnel_count as usize;
        let range = self.config.tunnel_range;
        let full = Vec3::splat(range);

        let mut curves = Vec::with_capacity(count);
        let mut branch_points: VecDeque<(Vec3, f32)> = VecDeque::with_capacity(count);

        // First segment: downward-biased endpoint from the origin
        let start = self.config.tunnel_origin;
        let (end, rng) = self.draw_point(rng, start, -full, Vec3::new(range, range / 4.0, range))?;
        let (control, rng) = self.draw_point(rng, (start + end) * 0.5, -full, full)?;
        let (start_radius, rng) = self.draw_radius(rng);
        let (end_radius, mut rng) = self.draw_radius(rng);

        curves.push(Curve { start, control, end, start_radius, end_radius });
        branch_points.push_back((end, end_radius));

        for _ in 1..count {
            let ((start, start_radius), next) = Self::pick_branch_point(rng, &mut branch_points, self.config.branchiness);
            let (end, next) = self.draw_point(next, start, -full, full)?;
            let (control, next) = self.draw_point(next, (start + end) * 0.5, -full, full)?;
            let (end_radius, next) = self.draw_radius(next);
            rng = next;

            curves.push(Curve { start, control, end, start_radius, end_radius });
            branch_points.push_back((end, end_radius));
        }

        log::debug!(
            "Generated {} tunnel curves ({} random draws, {} open branch points)",
            curves.len(),
            rng.draws(),
            branch_points.len()
        );

        Ok((curves, rng))
    }

    /// Rotate the queue while draws exceed `branchiness`, then dequeue the front
    fn pick_branch_point(
        mut rng: RandomSequence,
        queue: &mut VecDeque<(Vec3, f32)>,
        branchiness: f32,
    ) -> ((Vec3, f32), RandomSequence) {
        let mut rotations = 0;
        loop {
            let (u, next) = rng.next_unit();
            rng = next;
            if u <= branchiness || rotations >= MAX_BRANCH_ROTATIONS {
                break;
            }
            queue.rotate_left(1);
            rotations += 1;
        }
        // Each segment enqueues its endpoint, so the queue is never empty here
        let point = queue.pop_front().unwrap_or_default();
        (point, rng)
    }

    fn draw_radius(&self, rng: RandomSequence) -> (f32, RandomSequence) {
        rng.next_range(self.config.min_radius, self.config.max_radius)
    }

    /// Draw `base + offset` with each offset component in
    /// `[offset_min, offset_max)`, redrawing any component that lands outside
    /// the sampling bounds
    fn draw_point(
        &self,
        rng: RandomSequence,
        base: Vec3,
        offset_min: Vec3,
        offset_max: Vec3,
    ) -> Result<(Vec3, RandomSequence)> {
        let lo = base + offset_min;
        let hi = base + offset_max;
        let (x, rng) = draw_coord(rng, lo.x, hi.x, self.bounds.min.x, self.bounds.max.x)?;
        let (y, rng) = draw_coord(rng, lo.y, hi.y, self.bounds.min.y, self.bounds.max.y)?;
        let (z, rng) = draw_coord(rng, lo.z, hi.z, self.bounds.min.z, self.bounds.max.z)?;
        Ok((Vec3::new(x, y, z), rng))
    }
}

/// Rejection-sample one coordinate from `[lo, hi)` until it lands in
/// `[min, max]`
fn draw_coord(
    mut rng: RandomSequence,
    lo: f32,
    hi: f32,
    min: f32,
    max: f32,
) -> Result<(f32, RandomSequence)> {
    if hi < min || lo > max {
        return Err(Error::Config(format!(
            "tunnel range [{}, {}] never intersects the sampling bounds [{}, {}]",
            lo, hi, min, max
        )));
    }
    for _ in 0..MAX_REJECTION_DRAWS {
        let (v, next) = rng.next_range(lo, hi);
        rng = next;
        if v >= min && v <= max {
            return Ok((v, rng));
        }
    }
    Err(Error::Config(format!(
        "no coordinate in [{}, {}] fell inside [{}, {}] after {} draws; reduce tunnel_range or enlarge the world",
        lo, hi, min, max, MAX_REJECTION_DRAWS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorldConfig {
        WorldConfig { seed: 42, tunnel_count: 25, ..Default::default() }
    }

    fn generate(config: &WorldConfig) -> Vec<Curve> {
        let rng = RandomSequence::new(config.seed);
        CurveNetworkGenerator::new(config).generate(rng).expect("generation failed").0
    }

    #[test]
    fn test_curve_evaluation() {
        let curve = Curve {
            start: Vec3::ZERO,
            control: Vec3::new(2.0, 4.0, 0.0),
            end: Vec3::new(4.0, 0.0, 0.0),
            start_radius: 1.0,
            end_radius: 3.0,
        };
        assert_eq!(curve.point_at(0.0), curve.start);
        assert_eq!(curve.point_at(1.0), curve.end);
        // 0.25 * start + 0.5 * control + 0.25 * end
        assert_eq!(curve.point_at(0.5), Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(curve.radius_at(0.0), 1.0);
        assert_eq!(curve.radius_at(0.5), 2.0);
        assert_eq!(curve.radius_at(1.0), 3.0);
    }

    #[test]
    fn test_curve_count_and_origin() {
        let config = config();
        let curves = generate(&config);
        assert_eq!(curves.len(), 25);
        assert_eq!(curves[0].start, config.tunnel_origin);
    }

    #[test]
    fn test_points_stay_inside_sampling_bounds() {
        let config = config();
        let bounds = config.sampling_bounds();
        for curve in generate(&config) {
            assert!(bounds.contains_point(curve.start));
            assert!(bounds.contains_point(curve.control));
            assert!(bounds.contains_point(curve.end));
        }
    }

    #[test]
    fn test_first_curve_is_biased_downward() {
        for seed in 1..50 {
            let config = WorldConfig { seed, ..config() };
            let first = generate(&config)[0];
            let dy = first.end.y - first.start.y;
            assert!(dy <= config.tunnel_range / 4.0);
        }
    }

    #[test]
    fn test_radii_in_range() {
        let config = config();
        for curve in generate(&config) {
            for r in [curve.start_radius, curve.end_radius] {
                assert!(r >= config.min_radius && r <= config.max_radius);
            }
        }
    }

    #[test]
    fn test_branches_start_at_earlier_endpoints() {
        let curves = generate(&config());
        for (i, curve) in curves.iter().enumerate().skip(1) {
            let parent = curves[..i]
                .iter()
                .find(|c| c.end == curve.start)
                .expect("branch must start at an earlier endpoint");
            assert_eq!(parent.end_radius, curve.start_radius);
        }
    }

    #[test]
    fn test_deterministic() {
        let base = config();
        assert_eq!(generate(&base), generate(&base));

        let other = WorldConfig { seed: 43, ..config() };
        assert_ne!(generate(&other), generate(&base));
    }

    #[test]
    fn test_full_branchiness_chains_from_latest_endpoint() {
        let config = WorldConfig { tunnel_count: 4, branchiness: 1.0, ..config() };
        let curves = generate(&config);
        assert_eq!(curves.len(), 4);
        for pair in curves.windows(2) {
            assert_eq!(pair[1].start, pair[0].end);
            assert_eq!(pair[1].start_radius, pair[0].end_radius);
        }
    }

    #[test]
    fn test_zero_branchiness_terminates() {
        let config = WorldConfig { branchiness: 0.0, tunnel_count: 5, ..config() };
        assert_eq!(generate(&config).len(), 5);
    }

    #[test]
    fn test_branchiness_changes_network() {
        let bushy = WorldConfig { branchiness: 1.0, ..config() };
        let deep = WorldConfig { branchiness: 0.1, ..config() };
        assert_ne!(generate(&bushy), generate(&deep));
    }

    #[test]
    fn test_single_curve() {
        let config = WorldConfig { tunnel_count: 1, ..config() };
        assert_eq!(generate(&config).len(), 1);
    }

    #[test]
    fn test_unsatisfiable_range_is_config_error() {
        // Valid band is 80 units wide out of a 2e9 unit draw range
        let config = WorldConfig { tunnel_range: 1.0e9, ..config() };
        let result = CurveNetworkGenerator::new(&config).generate(RandomSequence::new(1));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_draw_coord_disjoint_interval() {
        let result = draw_coord(RandomSequence::new(1), 10.0, 20.0, -5.0, 5.0);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_range_reuses_base() {
        let config = WorldConfig { tunnel_range: 0.0, tunnel_count: 3, ..config() };
        for curve in generate(&config) {
            assert_eq!(curve.end, config.tunnel_origin);
            assert_eq!(curve.control, config.tunnel_origin);
        }
    }
}
