// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Windows backends: kernel semaphores and pagefile-backed file mappings.
// Kernel objects are reference counted by the OS, so "ownership" only
// decides who logs the destruction; the last handle closed removes them.

use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE, INVALID_HANDLE_VALUE, WAIT_OBJECT_0,
};
use windows_sys::Win32::System::Memory::{
    CreateFileMappingW, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, VirtualQuery,
    FILE_MAP_ALL_ACCESS, FILE_MAP_READ, MEMORY_BASIC_INFORMATION, MEMORY_MAPPED_VIEW_ADDRESS,
    PAGE_READWRITE,
};
use windows_sys::Win32::System::Threading::{
    CreateSemaphoreW, ReleaseSemaphore, WaitForSingleObject, INFINITE,
};

use crate::error::{Error, Result};
use crate::semaphore::SemaphoreAccessMode;
use crate::shm::ShmAccessPerms;

/// Encode a name as a null-terminated wide string for Win32 APIs.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

// ---------------------------------------------------------------------------
// PlatformSemaphore
// ---------------------------------------------------------------------------

pub struct PlatformSemaphore {
    handle: HANDLE,
    key: String,
    owner: AtomicBool,
}

unsafe impl Send for PlatformSemaphore {}
unsafe impl Sync for PlatformSemaphore {}

impl PlatformSemaphore {
    pub fn open(key: &str, init_val: u32, mode: SemaphoreAccessMode) -> Result<(Self, bool)> {
        if init_val > i32::MAX as u32 {
            return Err(Error::invalid_argument("initial semaphore count too large"));
        }
        let wide = to_wide(key);
        let h = unsafe { CreateSemaphoreW(ptr::null(), init_val as i32, i32::MAX, wide.as_ptr()) };
        if h.is_null() {
            return Err(Error::last_os_error("CreateSemaphoreW"));
        }
        let existed = unsafe { GetLastError() } == ERROR_ALREADY_EXISTS;
        let owner = !existed || mode == SemaphoreAccessMode::Create;
        if existed && mode == SemaphoreAccessMode::Create {
            // Keep the live object, other handles stay on it.
            if let Err(e) = Self::reset_count(h, init_val) {
                unsafe { CloseHandle(h) };
                return Err(e);
            }
            debug!("semaphore {key}: count reset to {init_val}");
        }
        let s = Self {
            handle: h,
            key: key.to_string(),
            owner: AtomicBool::new(owner),
        };
        Ok((s, owner))
    }

    /// Drain the count to zero, then release it up to `init_val`.
    fn reset_count(h: HANDLE, init_val: u32) -> Result<()> {
        while unsafe { WaitForSingleObject(h, 0) } == WAIT_OBJECT_0 {}
        if init_val > 0 && unsafe { ReleaseSemaphore(h, init_val as i32, ptr::null_mut()) } == 0 {
            return Err(Error::last_os_error("ReleaseSemaphore"));
        }
        Ok(())
    }

    pub fn acquire(&self) -> Result<()> {
        if unsafe { WaitForSingleObject(self.handle, INFINITE) } != WAIT_OBJECT_0 {
            return Err(Error::last_os_error("WaitForSingleObject"));
        }
        Ok(())
    }

    pub fn release(&self) -> Result<()> {
        if unsafe { ReleaseSemaphore(self.handle, 1, ptr::null_mut()) } == 0 {
            return Err(Error::last_os_error("ReleaseSemaphore"));
        }
        Ok(())
    }

    pub fn take_ownership(&self) {
        self.owner.store(true, Ordering::Release);
    }

    pub fn is_owner(&self) -> bool {
        self.owner.load(Ordering::Acquire)
    }

    pub fn unlink_by_key(_key: &str) {
        // Destroyed with the last handle.
    }
}

impl Drop for PlatformSemaphore {
    fn drop(&mut self) {
        if unsafe { CloseHandle(self.handle) } == 0 {
            warn!("semaphore {}: CloseHandle failed", self.key);
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformShm
// ---------------------------------------------------------------------------

pub struct PlatformShm {
    handle: HANDLE,
    mem: *mut u8,
    size: usize,
    key: String,
    owner: AtomicBool,
}

unsafe impl Send for PlatformShm {}
unsafe impl Sync for PlatformShm {}

impl PlatformShm {
    pub fn open(key: &str, size: usize, perms: ShmAccessPerms) -> Result<(Self, bool)> {
        let wide = to_wide(key);
        let map_access = match perms {
            ShmAccessPerms::ReadOnly => FILE_MAP_READ,
            ShmAccessPerms::ReadWrite => FILE_MAP_ALL_ACCESS,
        };

        let (handle, created) = if size == 0 {
            let h = unsafe { OpenFileMappingW(map_access, 0, wide.as_ptr()) };
            if h.is_null() {
                return Err(Error::last_os_error("OpenFileMappingW"));
            }
            (h, false)
        } else {
            let h = unsafe {
                CreateFileMappingW(
                    INVALID_HANDLE_VALUE,
                    ptr::null(),
                    PAGE_READWRITE,
                    ((size as u64) >> 32) as u32,
                    (size as u64 & 0xffff_ffff) as u32,
                    wide.as_ptr(),
                )
            };
            if h.is_null() {
                return Err(Error::last_os_error("CreateFileMappingW"));
            }
            (h, unsafe { GetLastError() } != ERROR_ALREADY_EXISTS)
        };

        let view = unsafe { MapViewOfFile(handle, map_access, 0, 0, 0) };
        if view.Value.is_null() {
            let e = Error::last_os_error("MapViewOfFile");
            unsafe { CloseHandle(handle) };
            return Err(e);
        }

        // Both sides adopt the page-rounded region so they agree on the size.
        let size = {
            let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
            let ret = unsafe {
                VirtualQuery(
                    view.Value,
                    &mut info,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if ret == 0 {
                let e = Error::last_os_error("VirtualQuery");
                unsafe {
                    UnmapViewOfFile(view);
                    CloseHandle(handle);
                }
                return Err(e);
            }
            info.RegionSize
        };

        debug!(
            "shm {key}: {} ({size} bytes)",
            if created { "created" } else { "attached" }
        );
        let shm = Self {
            handle,
            mem: view.Value as *mut u8,
            size,
            key: key.to_string(),
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

    pub fn unlink_by_key(_key: &str) {
        // Pagefile-backed: nothing to unlink.
    }
}

impl Drop for PlatformShm {
    fn drop(&mut self) {
        let view = MEMORY_MAPPED_VIEW_ADDRESS {
            Value: self.mem as *mut _,
        };
        if unsafe { UnmapViewOfFile(view) } == 0 {
            warn!("shm {}: UnmapViewOfFile failed", self.key);
        }
        if unsafe { CloseHandle(self.handle) } == 0 {
            warn!("shm {}: CloseHandle failed", self.key);
        }
    }
}
