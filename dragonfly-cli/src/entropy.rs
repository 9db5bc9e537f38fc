//! OS entropy, wired into the core through `EntropySource`.

use rand::rngs::OsRng;
use rand::TryRngCore;

use dragonfly_crypto::io::EntropySource;

pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, out: &mut [u8]) {
        OsRng.try_fill_bytes(out).expect("OS entropy source failed");
    }
}
