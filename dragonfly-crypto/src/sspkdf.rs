//! SSPKDF: a Skein-MAC-based password KDF used by the CBC_V2 envelope.

use zeroize::Zeroize;

use crate::skein;

pub const SALT_BYTES: usize = 16;
pub const KEY_BYTES: usize = 64;

/// Derive a 64-byte key from `password`, `salt`, and the given cost
/// parameters.
///
/// Builds `(password ‖ salt ‖ LE-u32 counter)` repeated `num_concat` times
/// with the counter incrementing each repetition, hashes the whole buffer
/// to an initial key, then alternates `key := Skein-MAC(key, buffer)` and
/// `key ^= buffer` for `num_iter` rounds total.
pub fn derive(out: &mut [u8; KEY_BYTES], password: &[u8], salt: &[u8; SALT_BYTES], num_iter: u32, num_concat: u32) {
    assert!(num_iter >= 1, "num_iter must be at least 1");

    let unit = password.len() + SALT_BYTES + 4;
    let mut concat = vec![0u8; unit * num_concat as usize];
    for i in 0..num_concat {
        let base = i as usize * unit;
        concat[base..base + password.len()].copy_from_slice(password);
        concat[base + password.len()..base + password.len() + SALT_BYTES].copy_from_slice(salt);
        concat[base + password.len() + SALT_BYTES..base + unit].copy_from_slice(&i.to_le_bytes());
    }

    let mut key = [0u8; KEY_BYTES];
    skein::hash_native(&mut key, &concat);

    let mut buffer = [0u8; KEY_BYTES];
    skein::mac(&mut buffer, &concat, &key);
    xor_in_place(&mut key, &buffer);

    for _ in 1..num_iter {
        let prev = buffer;
        skein::mac(&mut buffer, &prev, &key);
        xor_in_place(&mut key, &buffer);
    }

    skein::hash_native(out, &buffer);

    concat.zeroize();
    key.zeroize();
    buffer.zeroize();
}

fn xor_in_place(dst: &mut [u8; KEY_BYTES], src: &[u8; KEY_BYTES]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= s;
    }
}
