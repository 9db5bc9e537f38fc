//! The two end-to-end file envelopes: `Dragonfly_V1` (Catena + CTR +
//! Skein-MAC) and `CBC_V2` (SSPKDF + CBC + Skein-MAC, kept for reading
//! and writing older files).

pub mod cbc_v2;
pub mod dragonfly_v1;

use subtle::ConstantTimeEq;

/// Constant-time tag comparison. Mismatch must never branch on tag
/// contents, since MAC verification gates whether plaintext is trusted.
pub(crate) fn tags_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).into()
}
