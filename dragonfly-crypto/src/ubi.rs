//! Unique Block Iteration: chains Threefish over a byte stream under a
//! typed, positioned tweak, producing a 64-byte chaining value.

use crate::threefish::{self, ExternalKey, ExternalTweak};

pub const BLOCK_BYTES: usize = 64;

/// Skein-512 type field values.
pub mod ty {
    pub const KEY: u8 = 0;
    pub const CFG: u8 = 4;
    pub const PRS: u8 = 8;
    pub const PK: u8 = 12;
    pub const KDF: u8 = 16;
    pub const NON: u8 = 20;
    pub const MSG: u8 = 48;
    pub const OUT: u8 = 63;
}

const TWEAK_FIRST_BIT: u64 = 1 << 62;
const TWEAK_LAST_BIT: u64 = 1 << 63;

/// A running UBI chaining value.
#[derive(Clone, Copy)]
pub struct Ubi {
    chaining: [u8; BLOCK_BYTES],
}

impl Ubi {
    /// Start a fresh chain with a zero initial chaining value, as used for
    /// unkeyed hashing.
    pub fn zero() -> Self {
        Ubi {
            chaining: [0u8; BLOCK_BYTES],
        }
    }

    /// Start a chain preloaded with a known chaining value, as used by
    /// `Skein::hash_native`'s configuration-block skip.
    pub fn with_chaining(chaining: [u8; BLOCK_BYTES]) -> Self {
        Ubi { chaining }
    }

    pub fn chaining(&self) -> [u8; BLOCK_BYTES] {
        self.chaining
    }

    fn compress_block(&mut self, block: &[u8], block_type: u8, position: u64, first: bool, last: bool) {
        debug_assert!(block.len() <= BLOCK_BYTES);
        let mut msg = [0u8; BLOCK_BYTES];
        msg[..block.len()].copy_from_slice(block);

        let mut key_buf: ExternalKey = [0u64; 9];
        for (w, chunk) in key_buf[..8].iter_mut().zip(self.chaining.chunks_exact(8)) {
            *w = u64::from_le_bytes(chunk.try_into().unwrap());
        }

        let mut tweak_buf: ExternalTweak = [0u64; 3];
        tweak_buf[0] = position;
        let mut flags = (block_type as u64) << 56;
        if first {
            flags |= TWEAK_FIRST_BIT;
        }
        if last {
            flags |= TWEAK_LAST_BIT;
        }
        tweak_buf[1] = flags;

        let ks = threefish::OnDemand::rekey(&mut key_buf, &mut tweak_buf);
        let mut out = [0u8; BLOCK_BYTES];
        threefish::cipher(&ks, &mut out, &msg);
        for (o, m) in out.iter_mut().zip(msg.iter()) {
            *o ^= m;
        }
        self.chaining = out;
    }

    /// Chain an arbitrary-length message (or typed field) under `block_type`.
    /// An empty message still produces one (zero-padded) block.
    pub fn chain_message(&mut self, block_type: u8, data: &[u8]) {
        let total_blocks = if data.is_empty() {
            1
        } else {
            (data.len() + BLOCK_BYTES - 1) / BLOCK_BYTES
        };
        let mut offset = 0usize;
        for i in 0..total_blocks {
            let end = (offset + BLOCK_BYTES).min(data.len());
            let block = &data[offset..end];
            let first = i == 0;
            let last = i == total_blocks - 1;
            self.compress_block(block, block_type, end as u64, first, last);
            offset = end;
        }
    }

    /// Chain the 32-byte Skein configuration string for the given output
    /// length in bits.
    pub fn chain_config(&mut self, num_output_bits: u64) {
        let mut cfg = [0u8; 32];
        cfg[0..4].copy_from_slice(b"SHA3");
        cfg[4..6].copy_from_slice(&1u16.to_le_bytes()); // version
        cfg[8..16].copy_from_slice(&num_output_bits.to_le_bytes());
        self.chain_message(ty::CFG, &cfg);
    }

    /// Emit `out.len()` bytes of output chaining: the message is the
    /// little-endian 64-bit counter 0, 1, 2, ... under Type=Out, each
    /// starting fresh from the chaining value reached so far.
    pub fn chain_output(&self, out: &mut [u8]) {
        let mut produced = 0;
        let mut counter: u64 = 0;
        while produced < out.len() {
            let mut block_ubi = Ubi::with_chaining(self.chaining);
            block_ubi.compress_block(&counter.to_le_bytes(), ty::OUT, 8, true, true);
            let take = (out.len() - produced).min(BLOCK_BYTES);
            out[produced..produced + take].copy_from_slice(&block_ubi.chaining[..take]);
            produced += take;
            counter += 1;
        }
    }

    pub fn chain_native_output(&self, out: &mut [u8; BLOCK_BYTES]) {
        self.chain_output(out);
    }
}
