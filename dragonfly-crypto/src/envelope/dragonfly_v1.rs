//! Dragonfly_V1: Catena-derived keys, Threefish-CTR payload encryption,
//! Skein-MAC authentication.

use std::fmt;

use zeroize::Zeroize;

use crate::catena::{self, Variant};
use crate::ctr::Ctr;
use crate::error::{CryptoError, Result};
use crate::io::{EntropySource, FileRegion, PasswordSource};
use crate::secret::Lockable;
use crate::skein;
use crate::threefish::{self, ExternalKey, ExternalTweak};

use super::tags_match;

pub const ID: &[u8; 17] = b"SSC_DRAGONFLY_V1\0";
pub const PLAINTEXT_HEADER_BYTES: usize = 109;
pub const CIPHERTEXT_HEADER_BYTES: usize = 16;
pub const MAC_BYTES: usize = 64;

const TWEAK_BYTES: usize = 16;
const SALT_BYTES: usize = catena::SALT_BYTES;
const NONCE_BYTES: usize = 32;

/// The 109 plaintext bytes at the front of a Dragonfly_V1 file.
pub struct Header {
    pub total_size: u64,
    pub g_low: u8,
    pub g_high: u8,
    pub lambda: u8,
    pub use_phi: bool,
    pub tweak: [u8; TWEAK_BYTES],
    pub catena_salt: [u8; SALT_BYTES],
    pub ctr_nonce: [u8; NONCE_BYTES],
}

impl Header {
    fn to_bytes(&self) -> [u8; PLAINTEXT_HEADER_BYTES] {
        let mut buf = [0u8; PLAINTEXT_HEADER_BYTES];
        buf[0..17].copy_from_slice(ID);
        buf[17..25].copy_from_slice(&self.total_size.to_le_bytes());
        buf[25] = self.g_low;
        buf[26] = self.g_high;
        buf[27] = self.lambda;
        buf[28] = self.use_phi as u8;
        buf[29..45].copy_from_slice(&self.tweak);
        buf[45..77].copy_from_slice(&self.catena_salt);
        buf[77..109].copy_from_slice(&self.ctr_nonce);
        buf
    }

    fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < PLAINTEXT_HEADER_BYTES + CIPHERTEXT_HEADER_BYTES + MAC_BYTES {
            return Err(CryptoError::Truncated);
        }
        if &buf[0..17] != ID {
            return Err(CryptoError::UnknownId);
        }
        let total_size = u64::from_le_bytes(buf[17..25].try_into().unwrap());
        let mut tweak = [0u8; TWEAK_BYTES];
        tweak.copy_from_slice(&buf[29..45]);
        let mut catena_salt = [0u8; SALT_BYTES];
        catena_salt.copy_from_slice(&buf[45..77]);
        let mut ctr_nonce = [0u8; NONCE_BYTES];
        ctr_nonce.copy_from_slice(&buf[77..109]);
        Ok(Header {
            total_size,
            g_low: buf[25],
            g_high: buf[26],
            lambda: buf[27],
            use_phi: buf[28] != 0,
            tweak,
            catena_salt,
            ctr_nonce,
        })
    }

    fn variant(&self) -> Variant {
        if self.use_phi {
            Variant::Strong
        } else {
            Variant::Safe
        }
    }
}

/// Split a 64-byte Catena output into a 64-byte encryption key and a
/// 64-byte authentication key by hashing it out to 128 bytes.
fn split_keys(catena_out: &[u8; 64]) -> ([u8; 64], [u8; 64]) {
    let mut expanded = [0u8; 128];
    skein::hash(&mut expanded, catena_out);
    let mut enc_key = [0u8; 64];
    let mut auth_key = [0u8; 64];
    enc_key.copy_from_slice(&expanded[..64]);
    auth_key.copy_from_slice(&expanded[64..]);
    expanded.zeroize();
    (enc_key, auth_key)
}

fn key_buf_from(enc_key: &[u8; 64]) -> ExternalKey {
    let mut kb: ExternalKey = [0u64; 9];
    for (w, chunk) in kb[..8].iter_mut().zip(enc_key.chunks_exact(8)) {
        *w = u64::from_le_bytes(chunk.try_into().unwrap());
    }
    kb
}

fn tweak_buf_from(tweak: &[u8; TWEAK_BYTES]) -> ExternalTweak {
    let mut tb: ExternalTweak = [0u64; 3];
    tb[0] = u64::from_le_bytes(tweak[0..8].try_into().unwrap());
    tb[1] = u64::from_le_bytes(tweak[8..16].try_into().unwrap());
    tb
}

/// Encrypt `plaintext` into `out`, a region this call sizes itself.
/// `padding_bytes` of filler ciphertext are written between the
/// ciphertext header and the payload; the decrypter discards them using
/// the padding-length word, so their content does not matter. When
/// `supplement_entropy` is set, a second draw from `entropy` is mixed
/// into the CSPRNG's seed before any tweak/nonce/salt material is drawn.
#[allow(clippy::too_many_arguments)]
pub fn encrypt(
    plaintext: &[u8],
    out: &mut dyn FileRegion,
    passwords: &mut dyn PasswordSource,
    entropy: &mut dyn EntropySource,
    lockable: &dyn Lockable,
    g_low: u8,
    g_high: u8,
    lambda: u8,
    use_phi: bool,
    padding_bytes: usize,
    supplement_entropy: bool,
) -> Result<()> {
    let mut password = passwords
        .obtain_with_confirmation()
        .ok_or(CryptoError::PasswordEntryCancelled)?;
    lockable.lock(password.as_ptr(), password.len());

    let mut rng = crate::csprng::Csprng::new(entropy);
    if supplement_entropy {
        rng.os_reseed(entropy);
    }
    let mut tweak = [0u8; TWEAK_BYTES];
    let mut catena_salt = [0u8; SALT_BYTES];
    let mut ctr_nonce = [0u8; NONCE_BYTES];
    rng.get(&mut tweak);
    rng.get(&mut catena_salt);
    rng.get(&mut ctr_nonce);

    let variant = if use_phi { Variant::Strong } else { Variant::Safe };
    let mut catena_out = [0u8; 64];
    let catena_result = catena::call(&mut catena_out, &mut password, &catena_salt, g_low, g_high, lambda, variant);
    lockable.unlock(password.as_ptr(), password.len());
    password.zeroize();
    catena_result?;

    let (mut enc_key, mut auth_key) = split_keys(&catena_out);
    catena_out.zeroize();

    let mut key_buf = key_buf_from(&enc_key);
    let mut tweak_buf = tweak_buf_from(&tweak);
    enc_key.zeroize();
    let schedule = threefish::Stored::rekey(key_buf, tweak_buf);
    key_buf.zeroize();
    tweak_buf.zeroize();
    let ctr = Ctr::new(&schedule, ctr_nonce);

    let total_size =
        (PLAINTEXT_HEADER_BYTES + CIPHERTEXT_HEADER_BYTES + padding_bytes + plaintext.len() + MAC_BYTES) as u64;
    out.set_len(total_size)?;

    let header = Header {
        total_size,
        g_low,
        g_high,
        lambda,
        use_phi,
        tweak,
        catena_salt,
        ctr_nonce,
    };

    {
        let buf = out.as_mut_slice();
        buf[..PLAINTEXT_HEADER_BYTES].copy_from_slice(&header.to_bytes());

        let ct_header_start = PLAINTEXT_HEADER_BYTES;
        buf[ct_header_start..ct_header_start + 8].copy_from_slice(&(padding_bytes as u64).to_le_bytes());
        buf[ct_header_start + 8..ct_header_start + 16].copy_from_slice(&0u64.to_le_bytes());
        ctr.xorcrypt(&mut buf[ct_header_start..ct_header_start + CIPHERTEXT_HEADER_BYTES], 0);

        let padding_start = ct_header_start + CIPHERTEXT_HEADER_BYTES;
        if padding_bytes > 0 {
            ctr.xorcrypt(&mut buf[padding_start..padding_start + padding_bytes], CIPHERTEXT_HEADER_BYTES as u64);
        }

        let payload_start = padding_start + padding_bytes;
        buf[payload_start..payload_start + plaintext.len()].copy_from_slice(plaintext);
        ctr.xorcrypt(
            &mut buf[payload_start..payload_start + plaintext.len()],
            (CIPHERTEXT_HEADER_BYTES + padding_bytes) as u64,
        );

        let mac_start = buf.len() - MAC_BYTES;
        let mut tag = [0u8; MAC_BYTES];
        skein::mac(&mut tag, &buf[..mac_start], &auth_key);
        buf[mac_start..].copy_from_slice(&tag);
    }

    auth_key.zeroize();
    out.sync()?;
    Ok(())
}

/// Decrypt a Dragonfly_V1 file into `out`, which this call sizes to the
/// recovered plaintext length. Verifies the trailing MAC in constant
/// time before touching any ciphertext that would become plaintext.
pub fn decrypt(
    data: &[u8],
    out: &mut dyn FileRegion,
    passwords: &mut dyn PasswordSource,
    lockable: &dyn Lockable,
) -> Result<()> {
    let header = Header::from_bytes(data)?;
    if header.total_size != data.len() as u64 {
        return Err(CryptoError::SizeMismatch);
    }

    let mut password = passwords.obtain();
    lockable.lock(password.as_ptr(), password.len());

    let mut catena_out = [0u8; 64];
    let catena_result = catena::call(
        &mut catena_out,
        &mut password,
        &header.catena_salt,
        header.g_low,
        header.g_high,
        header.lambda,
        header.variant(),
    );
    lockable.unlock(password.as_ptr(), password.len());
    password.zeroize();
    catena_result?;

    let (mut enc_key, mut auth_key) = split_keys(&catena_out);
    catena_out.zeroize();

    let mac_start = data.len() - MAC_BYTES;
    let mut expected = [0u8; MAC_BYTES];
    skein::mac(&mut expected, &data[..mac_start], &auth_key);
    auth_key.zeroize();
    if !tags_match(&expected, &data[mac_start..]) {
        return Err(CryptoError::AuthenticationFailed);
    }

    let mut key_buf = key_buf_from(&enc_key);
    let mut tweak_buf = tweak_buf_from(&header.tweak);
    enc_key.zeroize();
    let schedule = threefish::Stored::rekey(key_buf, tweak_buf);
    key_buf.zeroize();
    tweak_buf.zeroize();
    let ctr = Ctr::new(&schedule, header.ctr_nonce);

    let ct_header_start = PLAINTEXT_HEADER_BYTES;
    let mut ct_header = [0u8; CIPHERTEXT_HEADER_BYTES];
    ct_header.copy_from_slice(&data[ct_header_start..ct_header_start + CIPHERTEXT_HEADER_BYTES]);
    ctr.xorcrypt(&mut ct_header, 0);
    let padding_length = u64::from_le_bytes(ct_header[0..8].try_into().unwrap()) as usize;

    let payload_start = ct_header_start + CIPHERTEXT_HEADER_BYTES + padding_length;
    let payload_len = mac_start - payload_start;
    out.set_len(payload_len as u64)?;
    {
        let out_buf = out.as_mut_slice();
        out_buf.copy_from_slice(&data[payload_start..payload_start + payload_len]);
        ctr.xorcrypt(out_buf, (CIPHERTEXT_HEADER_BYTES + padding_length) as u64);
    }
    out.sync()?;
    Ok(())
}

/// The publicly readable fields of a Dragonfly_V1 file: header plus the
/// trailing MAC, with no password or decryption involved.
pub struct HeaderDump {
    pub total_size: u64,
    pub g_low: u8,
    pub g_high: u8,
    pub lambda: u8,
    pub use_phi: bool,
    pub tweak: [u8; TWEAK_BYTES],
    pub catena_salt: [u8; SALT_BYTES],
    pub ctr_nonce: [u8; NONCE_BYTES],
    pub mac: [u8; MAC_BYTES],
}

pub fn dump_header(data: &[u8]) -> Result<HeaderDump> {
    let header = Header::from_bytes(data)?;
    let mut mac = [0u8; MAC_BYTES];
    mac.copy_from_slice(&data[data.len() - MAC_BYTES..]);
    Ok(HeaderDump {
        total_size: header.total_size,
        g_low: header.g_low,
        g_high: header.g_high,
        lambda: header.lambda,
        use_phi: header.use_phi,
        tweak: header.tweak,
        catena_salt: header.catena_salt,
        ctr_nonce: header.ctr_nonce,
        mac,
    })
}

impl fmt::Display for HeaderDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id:          {}", String::from_utf8_lossy(&ID[..16]))?;
        writeln!(f, "total_size:  {}", self.total_size)?;
        writeln!(f, "g_low:       {}", self.g_low)?;
        writeln!(f, "g_high:      {}", self.g_high)?;
        writeln!(f, "lambda:      {}", self.lambda)?;
        writeln!(f, "use_phi:     {}", self.use_phi)?;
        writeln!(f, "tweak:       {}", hex(&self.tweak))?;
        writeln!(f, "catena_salt: {}", hex(&self.catena_salt))?;
        writeln!(f, "ctr_nonce:   {}", hex(&self.ctr_nonce))?;
        write!(f, "mac:         {}", hex(&self.mac))
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPassword(&'static [u8]);
    impl PasswordSource for FixedPassword {
        fn obtain(&mut self) -> Vec<u8> {
            self.0.to_vec()
        }
        fn obtain_with_confirmation(&mut self) -> Option<Vec<u8>> {
            Some(self.0.to_vec())
        }
    }

    struct CountingEntropy(u8);
    impl EntropySource for CountingEntropy {
        fn fill(&mut self, out: &mut [u8]) {
            for (i, b) in out.iter_mut().enumerate() {
                *b = self.0.wrapping_add(i as u8);
            }
            self.0 = self.0.wrapping_add(1);
        }
    }

    struct VecRegion(Vec<u8>);
    impl FileRegion for VecRegion {
        fn as_slice(&self) -> &[u8] {
            &self.0
        }
        fn as_mut_slice(&mut self) -> &mut [u8] {
            &mut self.0
        }
        fn set_len(&mut self, new_len: u64) -> std::io::Result<()> {
            self.0.resize(new_len as usize, 0);
            Ok(())
        }
        fn sync(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    use crate::secret::NoLock;

    #[test]
    fn roundtrip_small_plaintext() {
        let plaintext = b"a short secret message".to_vec();
        let mut out = VecRegion(Vec::new());
        encrypt(
            &plaintext,
            &mut out,
            &mut FixedPassword(b"correct horse battery staple"),
            &mut CountingEntropy(5),
            &NoLock,
            1,
            2,
            1,
            false,
            0,
        )
        .unwrap();

        let mut recovered = VecRegion(Vec::new());
        decrypt(&out.0, &mut recovered, &mut FixedPassword(b"correct horse battery staple"), &NoLock).unwrap();
        assert_eq!(recovered.0, plaintext);
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let plaintext = b"some payload".to_vec();
        let mut out = VecRegion(Vec::new());
        encrypt(
            &plaintext,
            &mut out,
            &mut FixedPassword(b"right password"),
            &mut CountingEntropy(9),
            &NoLock,
            1,
            2,
            1,
            false,
            0,
        )
        .unwrap();

        let mut recovered = VecRegion(Vec::new());
        let err = decrypt(&out.0, &mut recovered, &mut FixedPassword(b"wrong password"), &NoLock).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailed));
    }

    #[test]
    fn corrupted_byte_fails_authentication() {
        let plaintext = vec![0x7a; 256];
        let mut out = VecRegion(Vec::new());
        encrypt(
            &plaintext,
            &mut out,
            &mut FixedPassword(b"password"),
            &mut CountingEntropy(3),
            &NoLock,
            1,
            2,
            1,
            true,
            0,
        )
        .unwrap();

        let last = out.0.len() - 1;
        out.0[last] ^= 0xff;

        let mut recovered = VecRegion(Vec::new());
        let err = decrypt(&out.0, &mut recovered, &mut FixedPassword(b"password"), &NoLock).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailed));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let plaintext = b"data".to_vec();
        let mut out = VecRegion(Vec::new());
        encrypt(
            &plaintext,
            &mut out,
            &mut FixedPassword(b"password"),
            &mut CountingEntropy(1),
            &NoLock,
            1,
            2,
            1,
            false,
            0,
        )
        .unwrap();
        out.0.push(0);

        let mut recovered = VecRegion(Vec::new());
        let err = decrypt(&out.0, &mut recovered, &mut FixedPassword(b"password"), &NoLock).unwrap_err();
        assert!(matches!(err, CryptoError::SizeMismatch));
    }
}
