//! Walks tunnel curves and buckets centerline samples by chunk

use super::curves::Curve;
use super::skeleton::{CurveSample, Skeleton};
use crate::world::WorldLayout;

/// Samples curves at `t = i / samples_per_curve` for `i` in `[0, samples_per_curve)`
pub struct CurveSampler<'a> {
    samples_per_curve: u32,
    layout: &'a WorldLayout,
}

impl<'a> CurveSampler<'a> {
    pub fn new(samples_per_curve: u32, layout: &'a WorldLayout) -> Self {
        Self { samples_per_curve, layout }
    }

    /// Sample one curve into the skeleton
    pub fn sample_into(&self, curve: &Curve, skeleton: &mut Skeleton) {
        for i in 0..self.samples_per_curve {
            let t = i as f32 / self.samples_per_curve as f32;
            let sample = CurveSample::new(curve.point_at(t), curve.radius_at(t));
            // Points exactly on the far world face map one past the last chunk
            let index = self.layout.clamp(self.layout.chunk_to_index(sample.position));
            skeleton.insert(index, sample);
        }
    }

    /// Sample every curve into a fresh skeleton
    pub fn sample_all(&self, curves: &[Curve]) -> Skeleton {
        let mut skeleton = Skeleton::new();
        for curve in curves {
            self.sample_into(curve, &mut skeleton);
        }
        skeleton
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn curve() -> Curve {
        Curve {
            start: Vec3::new(-6.0, 0.0, 0.0),
            control: Vec3::new(0.0, 4.0, 0.0),
            end: Vec3::new(6.0, 0.0, 0.0),
            start_radius: 1.0,
            end_radius: 2.0,
        }
    }

    #[test]
    fn test_sample_count_and_parameters() {
        let layout = WorldLayout::new(4, 4, 1.0);
        let skeleton = CurveSampler::new(4, &layout).sample_all(&[curve()]);
        assert_eq!(skeleton.sample_count(), 4);

        // t = 0 sample sits at the curve start with the start radius
        let first = skeleton.bucket(layout.chunk_to_index(curve().start));
        assert!(first.iter().any(|s| s.position == curve().start && s.radius == 1.0));

        // t = 1 is never sampled
        let all: Vec<_> = skeleton.buckets().flat_map(|(_, b)| b.iter().copied()).collect();
        assert!(all.iter().all(|s| s.position != curve().end));
        assert!(all.iter().any(|s| s.radius == 1.75));
    }

    #[test]
    fn test_samples_bucketed_by_position() {
        let layout = WorldLayout::new(4, 4, 1.0);
        let skeleton = CurveSampler::new(16, &layout).sample_all(&[curve()]);
        for (index, bucket) in skeleton.buckets() {
            for sample in bucket {
                assert_eq!(layout.chunk_to_index(sample.position), index);
            }
        }
    }

    #[test]
    fn test_far_face_is_clamped() {
        let layout = WorldLayout::new(4, 4, 1.0);
        let edge = Curve {
            start: Vec3::splat(8.0),
            control: Vec3::splat(8.0),
            end: Vec3::splat(8.0),
            start_radius: 1.0,
            end_radius: 1.0,
        };
        let skeleton = CurveSampler::new(1, &layout).sample_all(&[edge]);
        assert_eq!(skeleton.bucket(crate::world::ChunkIndex::new(3, 3, 3)).len(), 1);
    }
}
