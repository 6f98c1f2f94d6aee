// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX backends: named semaphores via sem_open, shared memory via shm_open
// + mmap. Keys come from `shm_name::platform_key` and already carry the
// leading '/'.

use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::semaphore::SemaphoreAccessMode;
use crate::shm::ShmAccessPerms;

/// S_IRUSR|S_IWUSR|S_IRGRP|S_IWGRP
const IPC_PERMS: libc::mode_t = 0o660;

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

fn c_key(key: &str) -> Result<CString> {
    CString::new(key).map_err(|_| Error::invalid_argument("platform key contains a NUL byte"))
}

/// Repeat `f` while it fails with `EINTR`.
fn retry_eintr<T: PartialEq>(failed: T, mut f: impl FnMut() -> T) -> T {
    loop {
        let r = f();
        if r != failed || errno() != libc::EINTR {
            return r;
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformSemaphore
// ---------------------------------------------------------------------------

pub struct PlatformSemaphore {
    sem: AtomicPtr<libc::sem_t>,
    // Handles replaced by `recreate`. Another thread may still be blocked in
    // `sem_wait` on one of them, so they are closed only on drop.
    retired: Mutex<Vec<*mut libc::sem_t>>,
    key: CString,
    init_val: u32,
    owner: AtomicBool,
    #[cfg(test)]
    stale_faults: std::sync::atomic::AtomicU32,
}

// Safety: named semaphores are process-shared kernel objects.
unsafe impl Send for PlatformSemaphore {}
unsafe impl Sync for PlatformSemaphore {}

impl PlatformSemaphore {
    /// Returns the handle and whether it owns destruction of the object:
    /// true when this call created it, or reset it in `Create` mode.
    pub fn open(key: &str, init_val: u32, mode: SemaphoreAccessMode) -> Result<(Self, bool)> {
        let key = c_key(key)?;
        let (sem, owner) = Self::create_handle(&key, init_val, mode)?;
        debug!("semaphore {key:?}: {}", if owner { "created" } else { "opened" });
        let s = Self {
            sem: AtomicPtr::new(sem),
            retired: Mutex::new(Vec::new()),
            key,
            init_val,
            owner: AtomicBool::new(owner),
            #[cfg(test)]
            stale_faults: std::sync::atomic::AtomicU32::new(0),
        };
        Ok((s, owner))
    }

    fn open_exclusive(key: &CStr, init_val: u32) -> *mut libc::sem_t {
        retry_eintr(libc::SEM_FAILED, || unsafe {
            libc::sem_open(
                key.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                IPC_PERMS as libc::c_uint,
                init_val as libc::c_uint,
            )
        })
    }

    fn create_handle(
        key: &CStr,
        init_val: u32,
        mode: SemaphoreAccessMode,
    ) -> Result<(*mut libc::sem_t, bool)> {
        // The object can vanish between the exclusive create and the attach.
        for _ in 0..3 {
            let sem = Self::open_exclusive(key, init_val);
            if sem != libc::SEM_FAILED {
                return Ok((sem, true));
            }
            if errno() != libc::EEXIST {
                return Err(Error::last_os_error("sem_open (create)"));
            }
            let h = retry_eintr(libc::SEM_FAILED, || unsafe { libc::sem_open(key.as_ptr(), 0) });
            if h == libc::SEM_FAILED {
                if errno() == libc::ENOENT {
                    continue;
                }
                return Err(Error::last_os_error("sem_open (attach)"));
            }
            if mode == SemaphoreAccessMode::Open {
                return Ok((h, false));
            }
            // Create: keep the live object, other handles stay on it.
            if let Err(e) = Self::reset_count(h, init_val) {
                unsafe { libc::sem_close(h) };
                return Err(e);
            }
            debug!("semaphore {key:?}: count reset to {init_val}");
            return Ok((h, true));
        }
        Err(Error::last_os_error("sem_open (attach)"))
    }

    /// Drain the count to zero, then post it up to `init_val`.
    fn reset_count(h: *mut libc::sem_t, init_val: u32) -> Result<()> {
        loop {
            if unsafe { libc::sem_trywait(h) } == 0 {
                continue;
            }
            match errno() {
                libc::EINTR => continue,
                libc::EAGAIN => break,
                code => return Err(Error::from_system(code, "sem_trywait")),
            }
        }
        for _ in 0..init_val {
            if unsafe { libc::sem_post(h) } != 0 {
                return Err(Error::last_os_error("sem_post"));
            }
        }
        Ok(())
    }

    fn handle(&self) -> *mut libc::sem_t {
        self.sem.load(Ordering::Acquire)
    }

    /// Replace a handle the kernel no longer recognises.
    fn recreate(&self) -> Result<()> {
        warn!("semaphore {:?}: handle is stale, recreating", self.key);
        let (sem, created) =
            Self::create_handle(&self.key, self.init_val, SemaphoreAccessMode::Open)?;
        let old = self.sem.swap(sem, Ordering::AcqRel);
        if created {
            self.owner.store(true, Ordering::Release);
        }
        self.retired.lock().push(old);
        Ok(())
    }

    #[cfg(test)]
    fn take_stale_fault(&self) -> bool {
        self.stale_faults
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    #[cfg(not(test))]
    fn take_stale_fault(&self) -> bool {
        false
    }

    fn wait_once(&self) -> std::result::Result<(), i32> {
        if self.take_stale_fault() {
            return Err(libc::EINVAL);
        }
        if retry_eintr(-1, || unsafe { libc::sem_wait(self.handle()) }) == 0 {
            Ok(())
        } else {
            Err(errno())
        }
    }

    fn post_once(&self) -> std::result::Result<(), i32> {
        if self.take_stale_fault() {
            return Err(libc::EINVAL);
        }
        if unsafe { libc::sem_post(self.handle()) } == 0 {
            Ok(())
        } else {
            Err(errno())
        }
    }

    /// Run `op`, recreating the handle and retrying once if it is stale.
    fn with_recovery(
        &self,
        what: &str,
        op: impl Fn(&Self) -> std::result::Result<(), i32>,
    ) -> Result<()> {
        match op(self) {
            Ok(()) => Ok(()),
            Err(libc::EINVAL) => {
                self.recreate()?;
                op(self).map_err(|code| Error::from_system(code, what))
            }
            Err(code) => Err(Error::from_system(code, what)),
        }
    }

    pub fn acquire(&self) -> Result<()> {
        self.with_recovery("sem_wait", Self::wait_once)
    }

    pub fn release(&self) -> Result<()> {
        self.with_recovery("sem_post", Self::post_once)
    }

    pub fn take_ownership(&self) {
        self.owner.store(true, Ordering::Release);
    }

    pub fn is_owner(&self) -> bool {
        self.owner.load(Ordering::Acquire)
    }

    pub fn unlink_by_key(key: &str) {
        if let Ok(k) = c_key(key) {
            unsafe { libc::sem_unlink(k.as_ptr()) };
        }
    }
}

impl Drop for PlatformSemaphore {
    fn drop(&mut self) {
        let retired = std::mem::take(self.retired.get_mut());
        for h in retired.into_iter().chain(std::iter::once(self.handle())) {
            if unsafe { libc::sem_close(h) } != 0 {
                warn!("semaphore {:?}: sem_close failed (errno {})", self.key, errno());
            }
        }
        if self.is_owner() && unsafe { libc::sem_unlink(self.key.as_ptr()) } != 0 {
            warn!("semaphore {:?}: sem_unlink failed (errno {})", self.key, errno());
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformShm
// ---------------------------------------------------------------------------

pub struct PlatformShm {
    mem: *mut u8,
    size: usize,
    key: CString,
    owner: AtomicBool,
}

// Safety: the mapping is process-shared; access is synchronized by callers.
unsafe impl Send for PlatformShm {}
unsafe impl Sync for PlatformShm {}

impl PlatformShm {
    /// Create (size > 0) or attach to a segment.
    /// Returns the handle and whether this call created the object.
    pub fn open(key: &str, size: usize, perms: ShmAccessPerms) -> Result<(Self, bool)> {
        let c_key = c_key(key)?;
        let access = match perms {
            ShmAccessPerms::ReadOnly => libc::O_RDONLY,
            ShmAccessPerms::ReadWrite => libc::O_RDWR,
        };

        let mut created = false;
        let mut fd = -1;
        if size > 0 {
            // Creator always opens read-write: ftruncate needs it.
            fd = retry_eintr(-1, || unsafe {
                libc::shm_open(
                    c_key.as_ptr(),
                    libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                    IPC_PERMS as libc::c_uint,
                )
            });
            if fd != -1 {
                created = true;
            } else if errno() != libc::EEXIST {
                return Err(Error::last_os_error("shm_open (create)"));
            }
        }
        if !created {
            fd = retry_eintr(-1, || unsafe {
                libc::shm_open(c_key.as_ptr(), access, IPC_PERMS as libc::c_uint)
            });
            if fd == -1 {
                return Err(Error::last_os_error("shm_open (attach)"));
            }
        }

        let fail = |fd: libc::c_int, what: &str| {
            let e = Error::last_os_error(what);
            unsafe { libc::close(fd) };
            if created {
                unsafe { libc::shm_unlink(c_key.as_ptr()) };
            }
            e
        };

        if created {
            // Mirror the requested permissions regardless of umask.
            unsafe { libc::fchmod(fd, IPC_PERMS) };
            if unsafe { libc::ftruncate(fd, size as libc::off_t) } != 0 {
                return Err(fail(fd, "ftruncate"));
            }
        }
        // Creator and attachers both take the size the kernel reports, which
        // macOS rounds up to a page.
        let size = {
            let mut st: libc::stat = unsafe { std::mem::zeroed() };
            if unsafe { libc::fstat(fd, &mut st) } != 0 {
                return Err(fail(fd, "fstat"));
            }
            st.st_size as usize
        };

        if size == 0 {
            unsafe { libc::close(fd) };
            return Err(Error::invalid_argument("shared memory segment has zero size"));
        }

        let prot = match perms {
            ShmAccessPerms::ReadOnly => libc::PROT_READ,
            ShmAccessPerms::ReadWrite => libc::PROT_READ | libc::PROT_WRITE,
        };
        let mem = unsafe { libc::mmap(ptr::null_mut(), size, prot, libc::MAP_SHARED, fd, 0) };
        if mem == libc::MAP_FAILED {
            return Err(fail(fd, "mmap"));
        }
        unsafe { libc::close(fd) };

        debug!(
            "shm {c_key:?}: {} ({size} bytes)",
            if created { "created" } else { "attached" }
        );
        let shm = Self {
            mem: mem as *mut u8,
            size,
            key: c_key,
            owner: AtomicBool::new(created),
        };
        Ok((shm, created))
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn take_ownership(&self) {
        self.owner.store(true, Ordering::Release);
    }

    pub fn is_owner(&self) -> bool {
        self.owner.load(Ordering::Acquire)
    }

    pub fn unlink_by_key(key: &str) {
        if let Ok(k) = c_key(key) {
            unsafe { libc::shm_unlink(k.as_ptr()) };
        }
    }
}

impl Drop for PlatformShm {
    fn drop(&mut self) {
        if unsafe { libc::munmap(self.mem as *mut libc::c_void, self.size) } != 0 {
            warn!("shm {:?}: munmap failed (errno {})", self.key, errno());
        }
        if self.is_owner() && unsafe { libc::shm_unlink(self.key.as_ptr()) } != 0 {
            warn!("shm {:?}: shm_unlink failed (errno {})", self.key, errno());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    // Short enough for macOS's 31-byte limit.
    fn key(tag: &str) -> String {
        format!("/lsp_{tag}_{}", std::process::id())
    }

    #[test]
    fn stale_handle_is_recreated_and_retried_once() {
        let k = key("stale");
        PlatformSemaphore::unlink_by_key(&k);
        let (sem, owner) = PlatformSemaphore::open(&k, 0, SemaphoreAccessMode::Create).unwrap();
        assert!(owner);

        sem.stale_faults.store(1, Ordering::SeqCst);
        sem.release().expect("retry after recreate");
        assert_eq!(sem.retired.lock().len(), 1);
        // Same named object: the post landed and the count survived.
        sem.acquire().expect("count of 1");

        // A second failure in a row is surfaced.
        sem.stale_faults.store(2, Ordering::SeqCst);
        let err = sem.release().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(sem.retired.lock().len(), 2);
        assert!(sem.is_owner());
    }

    #[test]
    fn recreate_after_out_of_band_unlink_joins_new_object() {
        let k = key("oob");
        PlatformSemaphore::unlink_by_key(&k);
        let (a, _) = PlatformSemaphore::open(&k, 0, SemaphoreAccessMode::Open).unwrap();
        PlatformSemaphore::unlink_by_key(&k);

        a.stale_faults.store(1, Ordering::SeqCst);
        a.release().expect("post on recreated object");
        assert!(a.is_owner());

        let (b, created) = PlatformSemaphore::open(&k, 0, SemaphoreAccessMode::Open).unwrap();
        assert!(!created);
        b.acquire().expect("sees the post made through the recreated handle");
    }

    #[test]
    fn create_mode_keeps_existing_object() {
        let k = key("reset");
        PlatformSemaphore::unlink_by_key(&k);
        let (a, _) = PlatformSemaphore::open(&k, 0, SemaphoreAccessMode::Open).unwrap();
        for _ in 0..5 {
            a.release().unwrap();
        }
        let (b, owner) = PlatformSemaphore::open(&k, 2, SemaphoreAccessMode::Create).unwrap();
        assert!(owner);
        // Both handles see the reset count of 2 on one object.
        a.acquire().unwrap();
        b.acquire().unwrap();
        assert_eq!(unsafe { libc::sem_trywait(a.handle()) }, -1);
    }

    #[test]
    fn creator_size_comes_from_fstat() {
        let k = key("shmsz");
        PlatformShm::unlink_by_key(&k);
        let (c, created) = PlatformShm::open(&k, 100, ShmAccessPerms::ReadWrite).unwrap();
        assert!(created);
        let (a, _) = PlatformShm::open(&k, 0, ShmAccessPerms::ReadWrite).unwrap();
        assert!(c.size() >= 100);
        assert_eq!(c.size(), a.size());
    }
}
