//! Seeded randomness for models.
//!
//! A model holds one [`SimRng`] built from its seed and lends `&mut rng` to
//! every random cell-space operation, so a run replays exactly from the
//! seed.  Replications and sub-models take a [`stream`](SimRng::stream) of
//! their own:
//!
//!   stream_seed = root_seed XOR ((index + 1) * STREAM_STRIDE)
//!
//! Streams depend only on the root seed and the index, never on how many
//! numbers the root has drawn, so adding a draw to one part of a model does
//! not reshuffle another.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

/// 64-bit fractional part of the golden ratio.
const STREAM_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// A model's random number generator.
///
/// Implements [`RngCore`], so `&mut SimRng` goes anywhere an `R: Rng` is
/// expected.
#[derive(Clone, Debug)]
pub struct SimRng {
    seed: u64,
    rng:  SmallRng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: SmallRng::seed_from_u64(seed) }
    }

    /// The seed this generator started from.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent generator number `index`, derived from the root seed.
    pub fn stream(&self, index: u64) -> SimRng {
        let offset = index.wrapping_add(1).wrapping_mul(STREAM_STRIDE);
        SimRng::new(self.seed ^ offset)
    }

    /// Start over from the original seed.
    pub fn rewind(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.seed);
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.rng.r#gen()
    }

    /// `true` with probability `p`; `p` outside [0, 1] is clamped.
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }
}

impl RngCore for SimRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
