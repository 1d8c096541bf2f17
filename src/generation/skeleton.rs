//! Sparse chunk-bucketed index of tunnel centerline samples

use std::collections::BTreeMap;

use glam::Vec3;

use crate::world::ChunkIndex;

/// One point on a tunnel's centerline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveSample {
    pub position: Vec3,
    pub radius: f32,
}

impl CurveSample {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }
}

/// The tunnel skeleton: every sample, bucketed by the chunk containing it.
///
/// Filled once while the world is built and read-only afterwards. Buckets
/// iterate in index order so encoding is stable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    buckets: BTreeMap<ChunkIndex, Vec<CurveSample>>,
    sample_count: usize,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample to a chunk's bucket
    pub fn insert(&mut self, index: ChunkIndex, sample: CurveSample) {
        self.buckets.entry(index).or_default().push(sample);
        self.sample_count += 1;
    }

    /// Samples in one chunk (empty slice for unoccupied chunks)
    pub fn bucket(&self, index: ChunkIndex) -> &[CurveSample] {
        self.buckets.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All occupied buckets in index order
    pub fn buckets(&self) -> impl Iterator<Item = (ChunkIndex, &[CurveSample])> {
        self.buckets.iter().map(|(&i, v)| (i, v.as_slice()))
    }

    pub fn occupied_chunks(&self) -> usize {
        self.buckets.len()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut skeleton = Skeleton::new();
        assert!(skeleton.is_empty());

        let a = ChunkIndex::new(1, 1, 1);
        skeleton.insert(a, CurveSample::new(Vec3::ONE, 2.0));
        skeleton.insert(a, CurveSample::new(Vec3::ZERO, 1.0));
        skeleton.insert(ChunkIndex::new(0, 0, 0), CurveSample::new(Vec3::NEG_ONE, 1.5));

        assert_eq!(skeleton.sample_count(), 3);
        assert_eq!(skeleton.occupied_chunks(), 2);
        assert_eq!(skeleton.bucket(a).len(), 2);
        assert!(skeleton.bucket(ChunkIndex::new(3, 3, 3)).is_empty());
    }

    #[test]
    fn test_buckets_iterate_in_index_order() {
        let mut skeleton = Skeleton::new();
        skeleton.insert(ChunkIndex::new(2, 0, 0), CurveSample::new(Vec3::ZERO, 1.0));
        skeleton.insert(ChunkIndex::new(0, 5, 0), CurveSample::new(Vec3::ZERO, 1.0));
        let order: Vec<_> = skeleton.buckets().map(|(i, _)| i).collect();
        assert_eq!(order, vec![ChunkIndex::new(0, 5, 0), ChunkIndex::new(2, 0, 0)]);
    }
}
