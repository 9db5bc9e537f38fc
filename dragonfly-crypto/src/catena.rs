//! Catena: a memory-hard password hash built from a bit-reversal graph
//! over Skein-512, with an optional randomizing "gamma" pass and an
//! optional sequential "phi" pass (the latter is what distinguishes the
//! `Strong` variant from `Safe`).
//!
//! The original implementation reuses one scratch buffer across flap,
//! gamma and phi by aliasing it through a C union, sized to whichever
//! stage needs the most room. Each stage here instead owns its own
//! precisely-typed, precisely-scoped local buffer; the compiler already
//! rules out the stale-variant reads the union made possible, so no
//! tagged-union stand-in earns its keep.

use zeroize::Zeroize;

use crate::error::{CryptoError, Result};
use crate::skein;

pub const SALT_BYTES: usize = 32;
const SKEIN_BYTES: usize = 64;
const TWEAK_BYTES: usize = SKEIN_BYTES + 1 + 1 + 2 + 2;

const DOMAIN_KDF: u8 = 0x01;

/// Precomputed chaining value standing in for Catena's `Hinit`: the
/// result of hashing an empty input through the Cfg stage with
/// `num_output_bits = 1024`, used by `flap`'s initial expansion step.
const FLAP_INIT_CHAINING: [u8; 64] = [
    0x54, 0x5e, 0x7a, 0x4c, 0x78, 0x32, 0xaf, 0xdb, 0xc7, 0xab, 0x18, 0xd2, 0x87, 0xd9, 0xe6, 0x2d,
    0x41, 0x08, 0x90, 0x3a, 0xcb, 0xa9, 0xa3, 0xae, 0x31, 0x08, 0xc7, 0xe4, 0x0e, 0x0e, 0x55, 0xa0,
    0xc3, 0x9c, 0xa8, 0x5d, 0x6c, 0xd2, 0x46, 0x71, 0xba, 0x1b, 0x58, 0x66, 0x31, 0xa3, 0xfd, 0x33,
    0x87, 0x69, 0x83, 0x54, 0x3c, 0x17, 0x93, 0x02, 0xd7, 0x59, 0x94, 0x61, 0x00, 0xb8, 0xb8, 0x07,
];

/// Precomputed chaining value for gamma's per-round randomizer expansion
/// (`num_output_bits = (Skein_Bytes + 16) * 8 = 640`).
const GAMMA_RNG_CHAINING: [u8; 64] = [
    0xf0, 0xef, 0xcb, 0xca, 0xbf, 0xd0, 0x04, 0x7b, 0xc0, 0x5d, 0x3e, 0x3a, 0x1d, 0x53, 0xe4, 0x9f,
    0x07, 0xbf, 0x4f, 0xf5, 0xce, 0x67, 0x53, 0x53, 0x9f, 0x0e, 0xf7, 0xfb, 0x22, 0xe6, 0xf4, 0xc3,
    0x74, 0xcc, 0xb9, 0xed, 0xc0, 0x50, 0x23, 0x81, 0x65, 0x27, 0x7a, 0xc2, 0xb2, 0xea, 0xfb, 0x96,
    0xcb, 0x91, 0xe2, 0x97, 0x59, 0x94, 0x1f, 0x6d, 0x51, 0xc3, 0x9f, 0xe5, 0x27, 0x31, 0xd1, 0xc5,
];

/// Version-ID hash embedded in Catena's tweak, distinguishing the two
/// strength profiles a caller can ask for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Variant {
    Safe,
    Strong,
}

impl Variant {
    fn version_id_hash(self) -> &'static [u8; 64] {
        match self {
            Variant::Safe => &SAFE_VERSION_ID_HASH,
            Variant::Strong => &STRONG_VERSION_ID_HASH,
        }
    }

    fn use_phi(self) -> bool {
        matches!(self, Variant::Strong)
    }
}

const SAFE_VERSION_ID_HASH: [u8; 64] = [
    0x79, 0xb5, 0x79, 0x1e, 0x9a, 0xac, 0x02, 0x64, 0x2a, 0xaa, 0x99, 0x1b, 0xd5, 0x47, 0xed, 0x14,
    0x74, 0x4d, 0x72, 0xbf, 0x13, 0x22, 0x54, 0xc9, 0xad, 0xd6, 0xb9, 0xbe, 0xe8, 0x70, 0x18, 0xe2,
    0xaa, 0x51, 0x50, 0xe2, 0x1f, 0xcd, 0x90, 0x19, 0xb6, 0x1f, 0x0e, 0xc6, 0x05, 0x00, 0xd6, 0xed,
    0x7c, 0xf2, 0x03, 0x53, 0xfd, 0x42, 0xa5, 0xa3, 0x7a, 0x0e, 0xbb, 0xb4, 0xa7, 0xeb, 0xdb, 0xab,
];

const STRONG_VERSION_ID_HASH: [u8; 64] = [
    0x1f, 0x23, 0x89, 0x58, 0x4a, 0x4a, 0xbb, 0xa5, 0x9f, 0x09, 0xca, 0xd4, 0xef, 0xac, 0x43, 0x1d,
    0xde, 0x9a, 0xb0, 0xf8, 0x69, 0xaa, 0x50, 0xf3, 0xed, 0xcc, 0xb4, 0x7d, 0x6d, 0x4f, 0x10, 0xb9,
    0x8e, 0x6a, 0x68, 0xab, 0x6e, 0x53, 0xbc, 0xd6, 0xcf, 0xfc, 0xa7, 0x63, 0x94, 0x44, 0xbd, 0xc7,
    0xb9, 0x6d, 0x09, 0xf5, 0x66, 0x31, 0xa3, 0xc5, 0xf3, 0x26, 0xeb, 0x6f, 0xa6, 0xac, 0xb0, 0xa6,
];

/// Bit-reversal graph index function: reverses the bits of `i`, then
/// keeps only the top `garlic` bits of that reversal.
fn brg_index(i: u64, garlic: u8) -> u64 {
    let mut i = i.swap_bytes();
    i = ((i & 0x0f0f_0f0f_0f0f_0f0fu64) << 4) | ((i & 0xf0f0_f0f0_f0f0_f0f0u64) >> 4);
    i = ((i & 0x3333_3333_3333_3333u64) << 2) | ((i & 0xcccc_cccc_cccc_ccccu64) >> 2);
    i = ((i & 0x5555_5555_5555_5555u64) << 1) | ((i & 0xaaaa_aaaa_aaaa_aaaau64) >> 1);
    i >> (64 - garlic as u32)
}

fn hash_two_words(dest: &mut [u8; 64], a: &[u8; 64], b: &[u8; 64]) {
    let mut concat = [0u8; 128];
    concat[..64].copy_from_slice(a);
    concat[64..].copy_from_slice(b);
    skein::hash_native(dest, &concat);
}

/// Run Catena's `call()` over `password`, salted with `salt`, at garlic
/// range `[g_low, g_high]` and shuffle count `lambda`, writing the
/// 64-byte result to `output`. Zeroes `password` in place once it has
/// been folded into the tweak, matching the upstream contract that the
/// caller's password buffer does not outlive this call.
///
/// `g_high` is attacker-controlled when decrypting (it comes straight
/// from the file header), so the graph allocation is fallible: a
/// header claiming an unreasonable garlic value fails cleanly with
/// `CryptoError::Alloc` instead of aborting the process.
pub fn call(output: &mut [u8; 64], password: &mut Vec<u8>, salt: &[u8; SALT_BYTES], g_low: u8, g_high: u8, lambda: u8, variant: Variant) -> Result<()> {
    if g_high >= 64 {
        return Err(CryptoError::Alloc(usize::MAX));
    }
    let graph_len = 1usize << g_high;
    let mut graph: Vec<[u8; 64]> = Vec::new();
    graph
        .try_reserve_exact(graph_len)
        .map_err(|_| CryptoError::Alloc(graph_len.saturating_mul(64)))?;
    graph.resize(graph_len, [0u8; 64]);

    let mut tweak = [0u8; TWEAK_BYTES];
    make_tweak(&mut tweak, variant, lambda);

    let mut tw_pw_slt = Vec::with_capacity(TWEAK_BYTES + password.len() + SALT_BYTES);
    tw_pw_slt.extend_from_slice(&tweak);
    tw_pw_slt.extend_from_slice(password);
    tw_pw_slt.extend_from_slice(salt);
    password.zeroize();

    let mut x = [0u8; 64];
    skein::hash_native(&mut x, &tw_pw_slt);
    tw_pw_slt.zeroize();

    flap(&mut graph, &mut x, salt, (g_low + 1) / 2, lambda, variant.use_phi());

    let x_copy = x;
    skein::hash_native(&mut x, &x_copy);

    for g in g_low..=g_high {
        flap(&mut graph, &mut x, salt, g, lambda, variant.use_phi());
        let mut catena_word = [0u8; 65];
        catena_word[0] = g;
        catena_word[1..].copy_from_slice(&x);
        skein::hash_native(&mut x, &catena_word);
    }

    graph.zeroize();
    *output = x;
    Ok(())
}

fn make_tweak(tweak: &mut [u8; TWEAK_BYTES], variant: Variant, lambda: u8) {
    tweak[..64].copy_from_slice(variant.version_id_hash());
    tweak[64] = DOMAIN_KDF;
    tweak[65] = lambda;
    tweak[66..68].copy_from_slice(&(SKEIN_BYTES as u16).to_le_bytes());
    tweak[68..70].copy_from_slice(&(SALT_BYTES as u16).to_le_bytes());
}

fn flap(graph: &mut [[u8; 64]], x: &mut [u8; 64], salt: &[u8; SALT_BYTES], garlic: u8, lambda: u8, use_phi: bool) {
    let max_hash_index = (1usize << garlic) - 1;
    let graph = &mut graph[..=max_hash_index];

    let mut w0 = [0u8; 64];
    let mut w1 = [0u8; 64];
    let mut w2;
    let mut tmp = [0u8; 64];
    {
        let mut expanded = [0u8; 128];
        skein::hash_from_chaining(FLAP_INIT_CHAINING, &mut expanded, x);
        w0.copy_from_slice(&expanded[..64]);
        w1.copy_from_slice(&expanded[64..]);
    }
    // words hold [ {-1}, {-2}, {**} ]

    hash_two_words(&mut tmp, &w0, &w1);
    w1 = tmp; // [ {-1}, {0}, {**} ]
    w2 = w0; // [ {-1}, {0}, {-1} ]
    hash_two_words(&mut tmp, &w1, &w2);
    w0 = tmp; // [ {1}, {0}, {-1} ]
    graph[0] = w1;
    graph[1] = w0;

    if max_hash_index > 1 {
        hash_two_words(&mut tmp, &w0, &w1);
        w2 = tmp; // {2}
        graph[2] = w2;

        w1 = w2; // {2}
        w2 = w0; // {1}

        hash_two_words(&mut tmp, &w1, &w2);
        w0 = tmp; // {3}
        graph[3] = w0;
    }

    for i in 4..=max_hash_index {
        hash_two_words(&mut tmp, &w0, &w1);
        w1 = w0;
        w0 = tmp;
        graph[i] = w0;
    }

    gamma(graph, salt, garlic);
    generic_graph_hash(graph, garlic, lambda);

    if use_phi {
        phi(graph, garlic);
    } else {
        x.copy_from_slice(&graph[max_hash_index]);
    }
}

fn gamma(graph: &mut [[u8; 64]], salt: &[u8; SALT_BYTES], garlic: u8) {
    let mut iv = [0u8; 64];
    {
        let mut seed = [0u8; SALT_BYTES + 1];
        seed[..SALT_BYTES].copy_from_slice(salt);
        seed[SALT_BYTES] = garlic;
        skein::hash_native(&mut iv, &seed);
    }

    let count = 1u64 << (((3 * garlic as u32) + 3) / 4);
    let mut rng = iv;
    for _ in 0..count {
        let mut expanded = [0u8; 80];
        skein::hash_from_chaining(GAMMA_RNG_CHAINING, &mut expanded, &rng);
        rng.copy_from_slice(&expanded[..64]);

        let j1 = (u64::from_le_bytes(expanded[64..72].try_into().unwrap()) >> (64 - garlic as u32)) as usize;
        let j2 = (u64::from_le_bytes(expanded[72..80].try_into().unwrap()) >> (64 - garlic as u32)) as usize;

        let word0 = graph[j1];
        let word1 = graph[j2];
        let mut updated = [0u8; 64];
        hash_two_words(&mut updated, &word0, &word1);
        graph[j1] = updated;
    }
}

fn generic_graph_hash(graph: &mut [[u8; 64]], garlic: u8, lambda: u8) {
    let garlic_end = (1usize << garlic) - 1;
    for _ in 1..=lambda {
        let mut dest = [0u8; 64];
        hash_two_words(&mut dest, &graph[garlic_end], &graph[brg_index(0, garlic) as usize]);
        graph[0] = dest;
        for i in 1..=garlic_end {
            hash_two_words(&mut dest, &graph[i - 1], &graph[brg_index(i as u64, garlic) as usize]);
            graph[i] = dest;
        }
    }
}

fn phi(graph: &mut [[u8; 64]], garlic: u8) {
    let last = (1usize << garlic) - 1;
    let right_shift = 64 - garlic as u32;

    let index_of = |word: &[u8; 64]| -> usize { (u64::from_le_bytes(word[..8].try_into().unwrap()) >> right_shift) as usize };

    let mut dest = [0u8; 64];
    let j = index_of(&graph[last]);
    hash_two_words(&mut dest, &graph[last], &graph[j]);
    graph[0] = dest;

    for i in 1..=last {
        let j = index_of(&graph[i - 1]);
        hash_two_words(&mut dest, &graph[i - 1], &graph[j]);
        graph[i] = dest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_and_strong_diverge() {
        let salt = [0u8; SALT_BYTES];
        let mut out_safe = [0u8; 64];
        let mut out_strong = [0u8; 64];
        call(&mut out_safe, &mut b"password".to_vec(), &salt, 1, 3, 1, Variant::Safe).unwrap();
        call(&mut out_strong, &mut b"password".to_vec(), &salt, 1, 3, 1, Variant::Strong).unwrap();
        assert_ne!(out_safe, out_strong);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let salt = [7u8; SALT_BYTES];
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        call(&mut a, &mut b"same".to_vec(), &salt, 1, 3, 1, Variant::Safe).unwrap();
        call(&mut b, &mut b"same".to_vec(), &salt, 1, 3, 1, Variant::Safe).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_salt() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        call(&mut a, &mut b"pw".to_vec(), &[0u8; SALT_BYTES], 1, 3, 1, Variant::Safe).unwrap();
        call(&mut b, &mut b"pw".to_vec(), &[1u8; SALT_BYTES], 1, 3, 1, Variant::Safe).unwrap();
        assert_ne!(a, b);
    }
}
