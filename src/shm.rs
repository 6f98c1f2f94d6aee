// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named, inter-process shared memory segment with an advisory lock.
// Delegates the mapping to platform::PlatformShm; the lock is a named
// semaphore with the same logical name and an initial count of 1.

use crate::error::{Error, Result};
use crate::platform::PlatformShm;
use crate::semaphore::{Semaphore, SemaphoreAccessMode};
use crate::shm_name::{platform_key, IpcObject};
use crate::ShmGuard;

/// Access permissions for the whole segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmAccessPerms {
    ReadOnly,
    ReadWrite,
}

/// A named, inter-process shared memory region.
///
/// The memory itself carries no synchronization: every reader and writer,
/// in every process, must bracket its accesses with [`lock`](Self::lock) /
/// [`unlock`](Self::unlock) or hold a [`ShmGuard`].
pub struct SharedMemory {
    // Field order matters: unmap before the lock semaphore goes away.
    inner: PlatformShm,
    sem: Semaphore,
    perms: ShmAccessPerms,
    name: String,
}

impl SharedMemory {
    /// Create a segment of at least `size` bytes, or attach to the existing
    /// one. With `size == 0` the segment must already exist; attachers
    /// adopt the segment's real size.
    pub fn new(name: &str, size: usize, perms: ShmAccessPerms) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid_argument("shared memory name is empty"));
        }
        let key = platform_key(name, IpcObject::SharedMemory)?;
        let (inner, created) = PlatformShm::open(&key, size, perms)?;
        // Always Open: an attacher may already hold the lock by the time the
        // creator gets here, and a reset would hand it out a second time.
        let sem = Semaphore::new(name, 1, SemaphoreAccessMode::Open)?;
        if created {
            sem.take_ownership();
        }
        Ok(Self {
            inner,
            sem,
            perms,
            name: name.to_string(),
        })
    }

    /// Start of the mapped region in this process.
    pub fn address(&self) -> *mut u8 {
        self.inner.as_mut_ptr()
    }

    /// Mapped size; never less than the size the creator requested.
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn perms(&self) -> ShmAccessPerms {
        self.perms
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquire the segment's cross-process lock (blocking).
    pub fn lock(&self) -> Result<()> {
        self.sem.acquire()
    }

    /// Release the segment's cross-process lock.
    pub fn unlock(&self) -> Result<()> {
        self.sem.release()
    }

    /// Lock the segment for the lifetime of the returned guard.
    pub fn guard(&self) -> Result<ShmGuard<'_>> {
        ShmGuard::new(self)
    }

    /// Make this handle destroy the segment (and its lock) on drop.
    pub fn take_ownership(&self) {
        self.inner.take_ownership();
        self.sem.take_ownership();
    }

    pub fn is_owner(&self) -> bool {
        self.inner.is_owner()
    }

    /// Remove a named segment and its lock without an open handle.
    pub fn clear_storage(name: &str) {
        if let Ok(key) = platform_key(name, IpcObject::SharedMemory) {
            PlatformShm::unlink_by_key(&key);
        }
        Semaphore::clear_storage(name);
    }
}
