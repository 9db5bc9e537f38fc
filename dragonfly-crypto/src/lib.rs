//! Threefish-512 / Skein-512 / Catena file-encryption engine.
//!
//! This crate carries no I/O, terminal, or entropy source of its own —
//! it consumes `EntropySource`, `PasswordSource`, `FileRegion`, and
//! `Lockable` from [`io`] and [`secret`], and embedders (a CLI, a
//! service) supply the concrete implementations. That keeps the
//! cryptographic core testable without a filesystem or a terminal.
//!
//! Two on-disk envelopes are exposed under [`envelope`]:
//! [`envelope::dragonfly_v1`] is the current format (Catena + CTR), and
//! [`envelope::cbc_v2`] is kept for reading and writing older files.

pub mod catena;
pub mod cbc;
pub mod csprng;
pub mod ctr;
pub mod envelope;
pub mod error;
pub mod io;
pub mod secret;
pub mod skein;
pub mod sspkdf;
pub mod threefish;
pub mod ubi;

pub use error::{CryptoError, Result};
