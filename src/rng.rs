//! Deterministic PRNG
//!
//! MT19937 Mersenne Twister. Every generator in the crate draws from this so
//! that a single 32-bit seed reproduces an entire level.

use rand::{RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// Mersenne Twister random number generator.
///
/// Identical seed, identical sequence. Construct with [`MtRng::new`] for
/// reproducible output; [`MtRng::from_time`] seeds from the wall clock and is
/// only for callers that explicitly do not want determinism.
#[derive(Clone)]
pub struct MtRng {
    state: [u32; N],
    index: usize,
}

impl MtRng {
    /// Create a generator from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        let mut rng = Self {
            state: [0; N],
            index: N + 1,
        };
        rng.seed(seed);
        rng
    }

    /// Create a generator from an arbitrary-length key, for seed spaces
    /// larger than 32 bits.
    pub fn from_key(key: &[u32]) -> Self {
        let mut rng = Self::new(19_650_218);
        rng.seed_array(key);
        rng
    }

    /// Create a generator seeded from the wall clock. Not reproducible.
    pub fn from_time() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::new(now.subsec_nanos() ^ now.as_secs() as u32)
    }

    /// Reset internal state from a 32-bit seed.
    pub fn seed(&mut self, seed: u32) {
        self.state[0] = seed;
        for i in 1..N {
            let prev = self.state[i - 1];
            self.state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        self.index = N;
    }

    /// Reset internal state from an arbitrary-length key.
    ///
    /// Two-pass mix over the base-seeded state: a forward pass folding the
    /// key in with multiplier 1664525, then a backward pass with multiplier
    /// 1566083941, forcing the top bit of word 0 at the end.
    pub fn seed_array(&mut self, key: &[u32]) {
        self.seed(19_650_218);

        let mut i = 1usize;
        let mut j = 0usize;
        let mut k = N.max(key.len());
        while k > 0 {
            let prev = self.state[i - 1];
            self.state[i] = (self.state[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= N {
                self.state[0] = self.state[N - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
            k -= 1;
        }

        k = N - 1;
        while k > 0 {
            let prev = self.state[i - 1];
            self.state[i] = (self.state[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= N {
                self.state[0] = self.state[N - 1];
                i = 1;
            }
            k -= 1;
        }

        self.state[0] = 0x8000_0000;
        self.index = N;
    }

    /// Draw the next 32-bit word.
    pub fn next_uint32(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }

        let mut y = self.state[self.index];
        self.index += 1;

        // Tempering
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    /// Regenerate the full 624-word block.
    fn twist(&mut self) {
        for i in 0..N {
            let y = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % N] & LOWER_MASK);
            let mut next = y >> 1;
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[i] = self.state[(i + M) % N] ^ next;
        }
        self.index = 0;
    }

    /// Uniform draw in [0,1], both endpoints reachable.
    pub fn real(&mut self) -> f64 {
        self.next_uint32() as f64 * (1.0 / 4_294_967_295.0)
    }

    /// Uniform draw in (0,1), endpoints excluded.
    pub fn real_exclusive(&mut self) -> f64 {
        (self.next_uint32() as f64 + 0.5) * (1.0 / 4_294_967_296.0)
    }

    /// Uniform draw in [0,1) at 32-bit resolution.
    pub fn rnd(&mut self) -> f64 {
        self.next_uint32() as f64 * (1.0 / 4_294_967_296.0)
    }

    /// Uniform draw in [0,1) at 53-bit resolution. Consumes two words.
    pub fn rnd_hi_res(&mut self) -> f64 {
        let a = (self.next_uint32() >> 5) as f64;
        let b = (self.next_uint32() >> 6) as f64;
        (a * 67_108_864.0 + b) * (1.0 / 9_007_199_254_740_992.0)
    }

    /// Uniform integer in `[min, max)`.
    ///
    /// Computed as `min + floor(rnd() * (max - min))`; the truncation bias at
    /// very large ranges is accepted, not rejection-sampled.
    pub fn int_range(&mut self, min: i32, max: i32) -> i32 {
        min + (self.rnd() * (max - min) as f64).floor() as i32
    }
}

impl std::fmt::Debug for MtRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MtRng").field("index", &self.index).finish()
    }
}

impl RngCore for MtRng {
    fn next_u32(&mut self) -> u32 {
        self.next_uint32()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_uint32() as u64;
        let lo = self.next_uint32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_uint32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for MtRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
