//! Skein-seeded CSPRNG: a 64-byte seed stretched through repeated Skein
//! hashing, reseedable from an [`EntropySource`].

use zeroize::Zeroize;

use crate::io::EntropySource;
use crate::skein;

const STATE_BYTES: usize = 64;

pub struct Csprng {
    seed: [u8; STATE_BYTES],
    buffer: [u8; STATE_BYTES * 2],
}

impl Csprng {
    /// Build a generator seeded directly from `entropy`.
    pub fn new(entropy: &mut dyn EntropySource) -> Self {
        let mut seed = [0u8; STATE_BYTES];
        entropy.fill(&mut seed);
        Csprng {
            seed,
            buffer: [0u8; STATE_BYTES * 2],
        }
    }

    /// Mix `new_bytes` into the current seed: `seed := Skein(seed ‖ new_bytes)`.
    pub fn reseed(&mut self, new_bytes: &[u8]) {
        let mut concat = Vec::with_capacity(STATE_BYTES + new_bytes.len());
        concat.extend_from_slice(&self.seed);
        concat.extend_from_slice(new_bytes);
        skein::hash_native(&mut self.seed, &concat);
        concat.zeroize();
    }

    /// Mix fresh bytes drawn from `entropy` into the current seed.
    pub fn os_reseed(&mut self, entropy: &mut dyn EntropySource) {
        let mut fresh = [0u8; STATE_BYTES];
        entropy.fill(&mut fresh);
        self.reseed(&fresh);
    }

    /// Produce `out.len()` pseudorandom bytes, advancing the seed.
    pub fn get(&mut self, out: &mut [u8]) {
        let mut produced = 0;
        while produced < out.len() {
            skein::hash(&mut self.buffer, &self.seed);
            self.seed.copy_from_slice(&self.buffer[..STATE_BYTES]);
            let take = (out.len() - produced).min(STATE_BYTES);
            out[produced..produced + take].copy_from_slice(&self.buffer[STATE_BYTES..STATE_BYTES + take]);
            produced += take;
        }
        self.buffer.zeroize();
    }
}
