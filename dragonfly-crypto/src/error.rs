use thiserror::Error;

/// Errors surfaced by the cryptographic core.
///
/// A hostile or corrupted input file is indistinguishable from a wrong
/// password: both collapse to `AuthenticationFailed`.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("failed to allocate {0} bytes for the Catena graph")]
    Alloc(usize),

    #[error("input too small to be a valid envelope")]
    Truncated,

    #[error("unrecognized envelope identifier")]
    UnknownId,

    #[error("file size field does not match the actual file size")]
    SizeMismatch,

    #[error("authentication failed: wrong password, or the file is corrupt or tampered with")]
    AuthenticationFailed,

    #[error("password entry was cancelled or the two entries did not match")]
    PasswordEntryCancelled,

    #[error("invalid CBC padding")]
    BadPadding,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
