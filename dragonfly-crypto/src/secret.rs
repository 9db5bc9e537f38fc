//! Secret-buffer discipline: zeroize on drop, optional page-locking.
//!
//! The core never talks to the OS directly to pin memory; it only calls
//! through `Lockable`, supplied by whatever embeds this crate. Dropping a
//! `Secret<T>` always zeroizes, lock or no lock, on every exit path
//! including early returns from `?`.

use zeroize::Zeroize;

/// A capability to pin/unpin a byte range in physical memory. The core
/// consumes this through `Secret::lock`/`Secret::unlock`; it never calls
/// `mlock`/`VirtualLock` itself.
pub trait Lockable {
    fn lock(&self, addr: *const u8, len: usize);
    fn unlock(&self, addr: *const u8, len: usize);
}

/// No-op `Lockable`, used when the caller has no locking collaborator.
pub struct NoLock;

impl Lockable for NoLock {
    fn lock(&self, _addr: *const u8, _len: usize) {}
    fn unlock(&self, _addr: *const u8, _len: usize) {}
}

/// A buffer holding key material, password bytes, or other secrets.
///
/// Zeroized unconditionally when dropped. Optionally pinned in memory for
/// its lifetime via an injected `Lockable`.
pub struct Secret<T: Zeroize> {
    inner: T,
    locked: bool,
}

impl<T: Zeroize> Secret<T> {
    pub fn new(inner: T) -> Self {
        Secret {
            inner,
            locked: false,
        }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Pin the buffer in memory through `lockable`, for as long as the
    /// returned guard value is not dropped by the caller dropping `self`.
    pub fn lock_with(&mut self, lockable: &dyn Lockable)
    where
        T: AsRef<[u8]>,
    {
        let slice = self.inner.as_ref();
        lockable.lock(slice.as_ptr(), slice.len());
        self.locked = true;
    }

    pub fn unlock_with(&mut self, lockable: &dyn Lockable)
    where
        T: AsRef<[u8]>,
    {
        if self.locked {
            let slice = self.inner.as_ref();
            lockable.unlock(slice.as_ptr(), slice.len());
            self.locked = false;
        }
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroizes_on_drop() {
        let raw: *const u8;
        {
            let secret = Secret::new(vec![0x41u8; 32]);
            raw = secret.get().as_ptr();
            assert_eq!(secret.get()[0], 0x41);
        }
        // `raw` now points at freed/zeroized memory; we don't dereference
        // it post-drop, this only documents the intended lifecycle.
        let _ = raw;
    }
}
