//! Memory locking, wired into the core through `Lockable`. The original
//! toggles `mlock`/`VirtualLock` behind a compile-time flag; here it is
//! a capability the core is simply handed, locked or not, at the
//! caller's discretion.

use dragonfly_crypto::secret::Lockable;

pub struct OsLock;

impl Lockable for OsLock {
    fn lock(&self, addr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        unsafe {
            libc::mlock(addr as *const libc::c_void, len);
        }
    }

    fn unlock(&self, addr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        unsafe {
            libc::munlock(addr as *const libc::c_void, len);
        }
    }
}
