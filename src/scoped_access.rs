// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RAII guard that holds a segment's lock and exposes its bytes.

use log::warn;

use crate::error::{Error, ErrorKind, Result};
use crate::shm::{SharedMemory, ShmAccessPerms};

/// Holds the segment lock; unlocks on drop.
pub struct ShmGuard<'a> {
    shm: &'a SharedMemory,
}

impl<'a> ShmGuard<'a> {
    /// Locks `shm` immediately.
    pub fn new(shm: &'a SharedMemory) -> Result<Self> {
        shm.lock()?;
        Ok(Self { shm })
    }

    /// The whole mapped region.
    pub fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.shm.address(), self.shm.size()) }
    }

    /// The whole mapped region, writable. Fails on a read-only mapping.
    pub fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        if self.shm.perms() == ShmAccessPerms::ReadOnly {
            return Err(Error::new(
                ErrorKind::AccessDenied,
                "shared memory is mapped read-only",
            ));
        }
        Ok(unsafe { std::slice::from_raw_parts_mut(self.shm.address(), self.shm.size()) })
    }

    pub fn size(&self) -> usize {
        self.shm.size()
    }
}

impl Drop for ShmGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.shm.unlock() {
            warn!("shm {}: unlock failed: {e}", self.shm.name());
        }
    }
}
