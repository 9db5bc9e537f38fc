//! Skein-512: hash, fixed-width "native" hash, and keyed MAC, all built on
//! top of [`crate::ubi::Ubi`].

use crate::ubi::{ty, Ubi};

pub const DIGEST_BYTES: usize = 64;

/// Precomputed chaining value reached by hashing an empty key through the
/// Cfg stage with `num_output_bits = 512`. Using it directly lets
/// `hash_native` skip the configuration block.
const NATIVE_512_CHAINING: [u8; 64] = [
    0xce, 0x51, 0x9c, 0x74, 0xff, 0xad, 0x03, 0x49, 0x03, 0xdf, 0x46, 0x97, 0x39, 0xde, 0x95, 0x0d,
    0xce, 0x9b, 0xc7, 0x27, 0x41, 0x93, 0xd1, 0x8f, 0xb1, 0x2c, 0x35, 0xff, 0x29, 0x56, 0x25, 0x9a,
    0xb0, 0xa7, 0x6c, 0xdf, 0x99, 0x25, 0xb6, 0x5d, 0xf4, 0xc3, 0xd5, 0xa9, 0x4c, 0x39, 0xbe, 0xea,
    0x23, 0xb5, 0x75, 0x1a, 0xc7, 0x12, 0x11, 0x99, 0x33, 0xcc, 0x0f, 0x66, 0x0b, 0xa4, 0x18, 0xae,
];

/// Unkeyed hash to an arbitrary output length.
pub fn hash(out: &mut [u8], msg: &[u8]) {
    let mut ubi = Ubi::zero();
    ubi.chain_config((out.len() as u64) * 8);
    ubi.chain_message(ty::MSG, msg);
    ubi.chain_output(out);
}

/// Hash `msg` starting from a caller-supplied chaining value instead of
/// zero, skipping the configuration block entirely. Catena's flap and
/// gamma stages use this with their own precomputed constants to get a
/// cheap fixed-width expansion out of Skein without re-deriving a config
/// chaining value every call.
pub(crate) fn hash_from_chaining(chaining: [u8; DIGEST_BYTES], out: &mut [u8], msg: &[u8]) {
    let mut ubi = Ubi::with_chaining(chaining);
    ubi.chain_message(ty::MSG, msg);
    ubi.chain_output(out);
}

/// Unkeyed hash to the native 512-bit (64-byte) output, skipping the
/// configuration block by starting from its precomputed result.
pub fn hash_native(out: &mut [u8; DIGEST_BYTES], msg: &[u8]) {
    let mut ubi = Ubi::with_chaining(NATIVE_512_CHAINING);
    ubi.chain_message(ty::MSG, msg);
    ubi.chain_native_output(out);
}

/// Keyed hash (MAC): chains the key under Type=Key before the usual
/// Cfg/Msg/Out sequence, so the configuration and message stages run from
/// a key-dependent chaining value instead of zero.
pub fn mac(out: &mut [u8], msg: &[u8], key: &[u8]) {
    let mut ubi = Ubi::zero();
    ubi.chain_message(ty::KEY, key);
    ubi.chain_config((out.len() as u64) * 8);
    ubi.chain_message(ty::MSG, msg);
    ubi.chain_output(out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_of_single_0xff_byte() {
        let mut out = [0u8; 64];
        hash_native(&mut out, &[0xff]);
        let expected: [u8; 64] = [
            0x71, 0xb7, 0xbc, 0xe6, 0xfe, 0x64, 0x52, 0x22, 0x7b, 0x9c, 0xed, 0x60, 0x14, 0x24, 0x9e, 0x5b,
            0xf9, 0xa9, 0x75, 0x4c, 0x3a, 0xd6, 0x18, 0xcc, 0xc4, 0xe0, 0xaa, 0xe1, 0x6b, 0x31, 0x6c, 0xc8,
            0xca, 0x69, 0x8d, 0x86, 0x43, 0x07, 0xed, 0x3e, 0x80, 0xb6, 0xef, 0x15, 0x70, 0x81, 0x2a, 0xc5,
            0x27, 0x2d, 0xc4, 0x09, 0xb5, 0xa0, 0x12, 0xdf, 0x2a, 0x57, 0x91, 0x02, 0xf3, 0x40, 0x61, 0x7a,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn hash_and_hash_native_agree_on_64_byte_output() {
        let mut generic = [0u8; 64];
        let mut native = [0u8; 64];
        hash(&mut generic, b"agree");
        hash_native(&mut native, b"agree");
        assert_eq!(generic, native);
    }

    #[test]
    fn mac_depends_on_key() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        mac(&mut a, b"message", b"key-one");
        mac(&mut b, b"message", b"key-two");
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_deterministic() {
        let mut a = [0u8; 48];
        let mut b = [0u8; 48];
        hash(&mut a, b"deterministic");
        hash(&mut b, b"deterministic");
        assert_eq!(a, b);
    }
}
