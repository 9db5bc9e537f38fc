//! CBC_V2: the legacy envelope, kept for reading and writing older
//! files. SSPKDF-derived key, Threefish-CBC payload encryption,
//! Skein-MAC authentication.

use std::fmt;

use zeroize::Zeroize;

use crate::cbc;
use crate::error::{CryptoError, Result};
use crate::io::{FileRegion, PasswordSource};
use crate::secret::Lockable;
use crate::skein;
use crate::sspkdf;
use crate::threefish::{self, ExternalKey, ExternalTweak, BLOCK_BYTES};

use super::tags_match;

pub const ID: &[u8; 14] = b"3CRYPT_CBC_V2\0";
pub const PLAINTEXT_HEADER_BYTES: usize = 126;
pub const MAC_BYTES: usize = 64;

const TWEAK_BYTES: usize = 16;
const SSPKDF_SALT_BYTES: usize = sspkdf::SALT_BYTES;

pub struct Header {
    pub total_size: u64,
    pub tweak: [u8; TWEAK_BYTES],
    pub sspkdf_salt: [u8; SSPKDF_SALT_BYTES],
    pub cbc_iv: [u8; BLOCK_BYTES],
    pub num_iter: u32,
    pub num_concat: u32,
}

impl Header {
    fn to_bytes(&self) -> [u8; PLAINTEXT_HEADER_BYTES] {
        let mut buf = [0u8; PLAINTEXT_HEADER_BYTES];
        buf[0..14].copy_from_slice(ID);
        buf[14..22].copy_from_slice(&self.total_size.to_le_bytes());
        buf[22..38].copy_from_slice(&self.tweak);
        buf[38..54].copy_from_slice(&self.sspkdf_salt);
        buf[54..118].copy_from_slice(&self.cbc_iv);
        buf[118..122].copy_from_slice(&self.num_iter.to_le_bytes());
        buf[122..126].copy_from_slice(&self.num_concat.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < PLAINTEXT_HEADER_BYTES + MAC_BYTES {
            return Err(CryptoError::Truncated);
        }
        if &buf[0..14] != ID {
            return Err(CryptoError::UnknownId);
        }
        let total_size = u64::from_le_bytes(buf[14..22].try_into().unwrap());
        let mut tweak = [0u8; TWEAK_BYTES];
        tweak.copy_from_slice(&buf[22..38]);
        let mut sspkdf_salt = [0u8; SSPKDF_SALT_BYTES];
        sspkdf_salt.copy_from_slice(&buf[38..54]);
        let mut cbc_iv = [0u8; BLOCK_BYTES];
        cbc_iv.copy_from_slice(&buf[54..118]);
        let num_iter = u32::from_le_bytes(buf[118..122].try_into().unwrap());
        let num_concat = u32::from_le_bytes(buf[122..126].try_into().unwrap());
        Ok(Header {
            total_size,
            tweak,
            sspkdf_salt,
            cbc_iv,
            num_iter,
            num_concat,
        })
    }
}

fn key_buf_from(key: &[u8; 64]) -> ExternalKey {
    let mut kb: ExternalKey = [0u64; 9];
    for (w, chunk) in kb[..8].iter_mut().zip(key.chunks_exact(8)) {
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

/// Encrypt `plaintext` into `out` with an SSPKDF-derived key. `tweak`,
/// `sspkdf_salt`, and `cbc_iv` are caller-supplied (normally drawn from
/// the CSPRNG by the caller) so this module stays independent of any
/// particular entropy source.
#[allow(clippy::too_many_arguments)]
pub fn encrypt(
    plaintext: &[u8],
    out: &mut dyn FileRegion,
    passwords: &mut dyn PasswordSource,
    lockable: &dyn Lockable,
    tweak: [u8; TWEAK_BYTES],
    sspkdf_salt: [u8; SSPKDF_SALT_BYTES],
    cbc_iv: [u8; BLOCK_BYTES],
    num_iter: u32,
    num_concat: u32,
) -> Result<()> {
    let mut password = passwords
        .obtain_with_confirmation()
        .ok_or(CryptoError::PasswordEntryCancelled)?;
    lockable.lock(password.as_ptr(), password.len());

    let mut derived = [0u8; 64];
    sspkdf::derive(&mut derived, &password, &sspkdf_salt, num_iter, num_concat);
    lockable.unlock(password.as_ptr(), password.len());
    password.zeroize();

    let mut key_buf = key_buf_from(&derived);
    let mut tweak_buf = tweak_buf_from(&tweak);
    let schedule = threefish::Stored::rekey(key_buf, tweak_buf);
    key_buf.zeroize();
    tweak_buf.zeroize();

    let padded_len = cbc::padded_ciphertext_size(plaintext.len() as u64) as usize;
    let total_size = (PLAINTEXT_HEADER_BYTES + padded_len + MAC_BYTES) as u64;
    out.set_len(total_size)?;

    let header = Header {
        total_size,
        tweak,
        sspkdf_salt,
        cbc_iv,
        num_iter,
        num_concat,
    };

    {
        let buf = out.as_mut_slice();
        buf[..PLAINTEXT_HEADER_BYTES].copy_from_slice(&header.to_bytes());
        let ciphertext_region = &mut buf[PLAINTEXT_HEADER_BYTES..PLAINTEXT_HEADER_BYTES + padded_len];
        cbc::encrypt(&schedule, &cbc_iv, plaintext, ciphertext_region);

        let mac_start = buf.len() - MAC_BYTES;
        let mut tag = [0u8; MAC_BYTES];
        skein::mac(&mut tag, &buf[..mac_start], &derived);
        buf[mac_start..].copy_from_slice(&tag);
        tag.zeroize();
    }
    derived.zeroize();

    out.sync()?;
    Ok(())
}

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

    let mut derived = [0u8; 64];
    sspkdf::derive(&mut derived, &password, &header.sspkdf_salt, header.num_iter, header.num_concat);
    lockable.unlock(password.as_ptr(), password.len());
    password.zeroize();

    let mac_start = data.len() - MAC_BYTES;
    let mut expected = [0u8; MAC_BYTES];
    skein::mac(&mut expected, &data[..mac_start], &derived);
    if !tags_match(&expected, &data[mac_start..]) {
        derived.zeroize();
        return Err(CryptoError::AuthenticationFailed);
    }

    let mut key_buf = key_buf_from(&derived);
    let mut tweak_buf = tweak_buf_from(&header.tweak);
    derived.zeroize();
    let schedule = threefish::Stored::rekey(key_buf, tweak_buf);
    key_buf.zeroize();
    tweak_buf.zeroize();

    let ciphertext = &data[PLAINTEXT_HEADER_BYTES..mac_start];
    let mut scratch = vec![0u8; ciphertext.len()];
    let plaintext_len = cbc::decrypt(&schedule, &header.cbc_iv, ciphertext, &mut scratch)?;

    out.set_len(plaintext_len as u64)?;
    out.as_mut_slice().copy_from_slice(&scratch[..plaintext_len]);
    scratch.zeroize();
    out.sync()?;
    Ok(())
}

pub struct HeaderDump {
    pub total_size: u64,
    pub tweak: [u8; TWEAK_BYTES],
    pub sspkdf_salt: [u8; SSPKDF_SALT_BYTES],
    pub cbc_iv: [u8; BLOCK_BYTES],
    pub num_iter: u32,
    pub num_concat: u32,
    pub mac: [u8; MAC_BYTES],
}

pub fn dump_header(data: &[u8]) -> Result<HeaderDump> {
    let header = Header::from_bytes(data)?;
    let mut mac = [0u8; MAC_BYTES];
    mac.copy_from_slice(&data[data.len() - MAC_BYTES..]);
    Ok(HeaderDump {
        total_size: header.total_size,
        tweak: header.tweak,
        sspkdf_salt: header.sspkdf_salt,
        cbc_iv: header.cbc_iv,
        num_iter: header.num_iter,
        num_concat: header.num_concat,
        mac,
    })
}

impl fmt::Display for HeaderDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id:          {}", String::from_utf8_lossy(&ID[..13]))?;
        writeln!(f, "total_size:  {}", self.total_size)?;
        writeln!(f, "tweak:       {}", hex(&self.tweak))?;
        writeln!(f, "sspkdf_salt: {}", hex(&self.sspkdf_salt))?;
        writeln!(f, "cbc_iv:      {}", hex(&self.cbc_iv))?;
        writeln!(f, "num_iter:    {}", self.num_iter)?;
        writeln!(f, "num_concat:  {}", self.num_concat)?;
        write!(f, "mac:         {}", hex(&self.mac))
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
