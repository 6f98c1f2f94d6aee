// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Stub backends for targets with neither POSIX nor Win32 IPC.
// Every constructor fails with `NotImplemented`; no handle is ever built.

use crate::error::{Error, Result};
use crate::semaphore::SemaphoreAccessMode;
use crate::shm::ShmAccessPerms;

pub struct PlatformSemaphore {
    _priv: (),
}

impl PlatformSemaphore {
    pub fn open(_key: &str, _init_val: u32, _mode: SemaphoreAccessMode) -> Result<(Self, bool)> {
        Err(Error::not_implemented("named semaphores are not supported on this platform"))
    }

    pub fn acquire(&self) -> Result<()> {
        Err(Error::not_implemented("semaphore acquire"))
    }

    pub fn release(&self) -> Result<()> {
        Err(Error::not_implemented("semaphore release"))
    }

    pub fn take_ownership(&self) {}

    pub fn is_owner(&self) -> bool {
        false
    }

    pub fn unlink_by_key(_key: &str) {}
}

pub struct PlatformShm {
    _priv: (),
}

impl PlatformShm {
    pub fn open(_key: &str, _size: usize, _perms: ShmAccessPerms) -> Result<(Self, bool)> {
        Err(Error::not_implemented("shared memory is not supported on this platform"))
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        std::ptr::null_mut()
    }

    pub fn size(&self) -> usize {
        0
    }

    pub fn take_ownership(&self) {}

    pub fn is_owner(&self) -> bool {
        false
    }

    pub fn unlink_by_key(_key: &str) {}
}
