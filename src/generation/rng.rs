//! Deterministic random sequence for skeleton synthesis.
//!
//! Every value is a pure function of `(seed, draw index)`. The sequence is a
//! small `Copy` value that is threaded through the generator explicitly: each
//! draw consumes the current state and returns the next one, so draw order is
//! visible in the code that uses it.

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seeded, monotonically advancing pseudo-random source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomSequence {
    seed: u64,
    index: u64,
}

/// SplitMix64 finalizer
#[inline]
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl RandomSequence {
    /// Start a sequence at draw index 0
    pub fn new(seed: u64) -> Self {
        Self { seed, index: 0 }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> u64 {
        self.index
    }

    /// Raw 64-bit value for a given draw index
    pub fn value_at(seed: u64, index: u64) -> u64 {
        mix(mix(seed).wrapping_add(index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)))
    }

    /// Next raw value and the advanced sequence
    #[must_use]
    pub fn next_u64(self) -> (u64, Self) {
        let value = Self::value_at(self.seed, self.index);
        (value, Self { index: self.index + 1, ..self })
    }

    /// Uniform value in `[0, 1)`
    #[must_use]
    pub fn next_unit(self) -> (f32, Self) {
        let (bits, next) = self.next_u64();
        // Top 24 bits fill the f32 mantissa exactly
        ((bits >> 40) as f32 / (1u32 << 24) as f32, next)
    }

    /// Uniform value in `[min, max)` (`min` when the range is empty)
    #[must_use]
    pub fn next_range(self, min: f32, max: f32) -> (f32, Self) {
        let (u, next) = self.next_unit();
        (min + u * (max - min), next)
    }
}
