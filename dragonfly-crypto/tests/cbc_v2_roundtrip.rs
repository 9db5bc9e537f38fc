use dragonfly_crypto::envelope::cbc_v2::{decrypt, dump_header, encrypt};
use dragonfly_crypto::error::CryptoError;
use dragonfly_crypto::io::{FileRegion, PasswordSource};
use dragonfly_crypto::secret::NoLock;

struct FixedPassword(&'static [u8]);
impl PasswordSource for FixedPassword {
    fn obtain(&mut self) -> Vec<u8> {
        self.0.to_vec()
    }
    fn obtain_with_confirmation(&mut self) -> Option<Vec<u8>> {
        Some(self.0.to_vec())
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

#[test]
fn roundtrip_non_block_aligned_plaintext() {
    let plaintext = b"a legacy file written by an older build".to_vec();
    let mut out = VecRegion(Vec::new());
    encrypt(
        &plaintext,
        &mut out,
        &mut FixedPassword(b"legacy password"),
        &NoLock,
        [1u8; 16],
        [2u8; 16],
        [3u8; 64],
        10,
        10,
    )
    .unwrap();

    let mut recovered = VecRegion(Vec::new());
    decrypt(&out.0, &mut recovered, &mut FixedPassword(b"legacy password"), &NoLock).unwrap();
    assert_eq!(recovered.0, plaintext);
}

#[test]
fn wrong_password_fails_authentication() {
    let plaintext = b"secret payload".to_vec();
    let mut out = VecRegion(Vec::new());
    encrypt(
        &plaintext,
        &mut out,
        &mut FixedPassword(b"right password"),
        &NoLock,
        [9u8; 16],
        [8u8; 16],
        [7u8; 64],
        4,
        4,
    )
    .unwrap();

    let mut recovered = VecRegion(Vec::new());
    let err = decrypt(&out.0, &mut recovered, &mut FixedPassword(b"wrong password"), &NoLock).unwrap_err();
    assert!(matches!(err, CryptoError::AuthenticationFailed));
}

#[test]
fn header_dump_reads_fields_without_a_password() {
    let plaintext = b"dump me".to_vec();
    let mut out = VecRegion(Vec::new());
    encrypt(
        &plaintext,
        &mut out,
        &mut FixedPassword(b"pw"),
        &NoLock,
        [4u8; 16],
        [5u8; 16],
        [6u8; 64],
        2,
        2,
    )
    .unwrap();

    let dump = dump_header(&out.0).unwrap();
    assert_eq!(dump.tweak, [4u8; 16]);
    assert_eq!(dump.sspkdf_salt, [5u8; 16]);
    assert_eq!(dump.cbc_iv, [6u8; 64]);
    assert_eq!(dump.num_iter, 2);
    assert_eq!(dump.num_concat, 2);
}
