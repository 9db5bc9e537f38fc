//! Threefish-CBC with ISO/IEC 7816-4 padding.

use crate::error::{CryptoError, Result};
use crate::threefish::{self, KeySchedule, BLOCK_BYTES};

/// Size a plaintext of `n` bytes grows to once ISO/IEC 7816-4 padded: a
/// 0x80 byte plus zero-fill up to the next block boundary, or a whole
/// extra block if `n` is already block-aligned.
pub fn padded_ciphertext_size(n: u64) -> u64 {
    n + (BLOCK_BYTES as u64 - (n % BLOCK_BYTES as u64))
}

/// Encrypt `plaintext` under CBC with the given 64-byte IV, writing the
/// padded ciphertext (always a multiple of 64 bytes) to `out`. `out` must
/// be exactly `padded_ciphertext_size(plaintext.len())` bytes.
pub fn encrypt<K: KeySchedule>(schedule: &K, iv: &[u8; BLOCK_BYTES], plaintext: &[u8], out: &mut [u8]) {
    debug_assert_eq!(out.len() as u64, padded_ciphertext_size(plaintext.len() as u64));

    let mut state = *iv;
    let mut offset = 0usize;
    let full_blocks = plaintext.len() / BLOCK_BYTES;

    for i in 0..full_blocks {
        let block = &plaintext[i * BLOCK_BYTES..(i + 1) * BLOCK_BYTES];
        let mut input = [0u8; BLOCK_BYTES];
        for j in 0..BLOCK_BYTES {
            input[j] = block[j] ^ state[j];
        }
        let mut ciphertext = [0u8; BLOCK_BYTES];
        threefish::cipher(schedule, &mut ciphertext, &input);
        out[offset..offset + BLOCK_BYTES].copy_from_slice(&ciphertext);
        state = ciphertext;
        offset += BLOCK_BYTES;
    }

    let remainder = &plaintext[full_blocks * BLOCK_BYTES..];
    let mut last = [0u8; BLOCK_BYTES];
    last[..remainder.len()].copy_from_slice(remainder);
    last[remainder.len()] = 0x80;

    let mut input = [0u8; BLOCK_BYTES];
    for j in 0..BLOCK_BYTES {
        input[j] = last[j] ^ state[j];
    }
    let mut ciphertext = [0u8; BLOCK_BYTES];
    threefish::cipher(schedule, &mut ciphertext, &input);
    out[offset..offset + BLOCK_BYTES].copy_from_slice(&ciphertext);
}

/// Decrypt a padded CBC ciphertext (a multiple of 64 bytes) under the
/// given IV, writing the unpadded plaintext to the front of `out` and
/// returning its length. `out` must be at least `ciphertext.len()` bytes.
pub fn decrypt<K: KeySchedule>(
    schedule: &K,
    iv: &[u8; BLOCK_BYTES],
    ciphertext: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    debug_assert_eq!(ciphertext.len() % BLOCK_BYTES, 0);
    debug_assert!(out.len() >= ciphertext.len());

    let mut state = *iv;
    let num_blocks = ciphertext.len() / BLOCK_BYTES;

    for i in 0..num_blocks {
        let block = &ciphertext[i * BLOCK_BYTES..(i + 1) * BLOCK_BYTES];
        let mut plain = [0u8; BLOCK_BYTES];
        threefish::inverse_cipher(schedule, &mut plain, block);
        for j in 0..BLOCK_BYTES {
            out[i * BLOCK_BYTES + j] = plain[j] ^ state[j];
        }
        state.copy_from_slice(block);
    }

    let padding = count_iso_iec_7816_padding_bytes(&out[..ciphertext.len()])?;
    Ok(ciphertext.len() - padding)
}

fn count_iso_iec_7816_padding_bytes(plaintext: &[u8]) -> Result<usize> {
    for (count, &byte) in plaintext.iter().rev().enumerate() {
        if byte == 0x80 {
            return Ok(count + 1);
        }
        if byte != 0x00 {
            break;
        }
    }
    Err(CryptoError::BadPadding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threefish::{ExternalKey, ExternalTweak, OnDemand};

    fn schedule(key_buf: &mut ExternalKey, tweak_buf: &mut ExternalTweak) -> OnDemand<'_> {
        OnDemand::rekey(key_buf, tweak_buf)
    }

    #[test]
    fn roundtrip_non_aligned() {
        let mut key_buf: ExternalKey = [0u64; 9];
        let mut tweak_buf: ExternalTweak = [0u64; 3];
        key_buf[2] = 0x99;
        let ks = schedule(&mut key_buf, &mut tweak_buf);
        let iv = [0x11u8; BLOCK_BYTES];

        let plaintext = b"not a multiple of the block size at all";
        let padded_len = padded_ciphertext_size(plaintext.len() as u64) as usize;
        let mut ciphertext = vec![0u8; padded_len];
        encrypt(&ks, &iv, plaintext, &mut ciphertext);

        let mut recovered = vec![0u8; padded_len];
        let n = decrypt(&ks, &iv, &ciphertext, &mut recovered).unwrap();
        assert_eq!(&recovered[..n], &plaintext[..]);
    }

    #[test]
    fn roundtrip_block_aligned_adds_extra_block() {
        let mut key_buf: ExternalKey = [0u64; 9];
        let mut tweak_buf: ExternalTweak = [0u64; 3];
        let ks = schedule(&mut key_buf, &mut tweak_buf);
        let iv = [0u8; BLOCK_BYTES];

        let plaintext = vec![0x42u8; BLOCK_BYTES * 2];
        let padded_len = padded_ciphertext_size(plaintext.len() as u64) as usize;
        assert_eq!(padded_len, plaintext.len() + BLOCK_BYTES);

        let mut ciphertext = vec![0u8; padded_len];
        encrypt(&ks, &iv, &plaintext, &mut ciphertext);
        let mut recovered = vec![0u8; padded_len];
        let n = decrypt(&ks, &iv, &ciphertext, &mut recovered).unwrap();
        assert_eq!(&recovered[..n], &plaintext[..]);
    }

    #[test]
    fn corrupted_padding_is_rejected() {
        let mut key_buf: ExternalKey = [0u64; 9];
        let mut tweak_buf: ExternalTweak = [0u64; 3];
        let ks = schedule(&mut key_buf, &mut tweak_buf);
        let iv = [0u8; BLOCK_BYTES];

        let plaintext = b"short";
        let padded_len = padded_ciphertext_size(plaintext.len() as u64) as usize;
        let mut ciphertext = vec![0u8; padded_len];
        encrypt(&ks, &iv, plaintext, &mut ciphertext);
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xff;

        let mut recovered = vec![0u8; padded_len];
        assert!(decrypt(&ks, &iv, &ciphertext, &mut recovered).is_err());
    }
}
