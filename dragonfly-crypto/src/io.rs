//! Narrow interfaces the core consumes instead of touching the OS, a
//! terminal, or a filesystem directly. Concrete implementations live in
//! whatever binary embeds this crate.

/// A source of cryptographically strong random bytes (normally the OS).
pub trait EntropySource {
    fn fill(&mut self, out: &mut [u8]);
}

/// A source of password bytes from the user.
pub trait PasswordSource {
    /// Obtain a password once (decryption path).
    fn obtain(&mut self) -> Vec<u8>;

    /// Obtain a password with re-entry confirmation (encryption path).
    /// Returns `None` if the two entries disagree.
    fn obtain_with_confirmation(&mut self) -> Option<Vec<u8>>;
}

/// A byte-addressable mutable region backed by a file, with a settable
/// size. Stands in for the original's memory-mapped file wrapper.
pub trait FileRegion {
    fn as_slice(&self) -> &[u8];
    fn as_mut_slice(&mut self) -> &mut [u8];
    fn set_len(&mut self, new_len: u64) -> std::io::Result<()>;
    fn sync(&self) -> std::io::Result<()>;
}
