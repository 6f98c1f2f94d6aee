// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// In-process blocking mutex with an explicit lock/unlock API.
// This is the lock that condition variables pair with.

use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use parking_lot::lock_api::RawMutex as _;

use crate::error::{Error, Result};

/// A non-recursive blocking mutex.
///
/// Unlike `std::sync::Mutex` it does not guard data and does not hand out a
/// guard: callers pair [`lock`](Mutex::lock) and [`unlock`](Mutex::unlock)
/// themselves, which is what [`CondVar::wait`](crate::CondVar::wait) needs.
/// Ownership is not tracked per thread.
pub struct Mutex {
    raw: parking_lot::RawMutex,
    // Set by whoever acquired `raw`; cleared by exactly one `unlock`.
    held: AtomicBool,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
            held: AtomicBool::new(false),
        }
    }

    /// Lock the mutex (blocking, infinite timeout).
    pub fn lock(&self) {
        self.raw.lock();
        self.held.store(true, Ordering::Release);
    }

    /// Try to lock the mutex without blocking.
    pub fn trylock(&self) -> bool {
        if !self.raw.try_lock() {
            return false;
        }
        self.held.store(true, Ordering::Release);
        true
    }

    /// Unlock the mutex.
    ///
    /// Unlocking a mutex that is not locked is reported as
    /// [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument)
    /// instead of corrupting the lock state. Racing unlocks of one
    /// acquisition are resolved the same way: exactly one succeeds.
    pub fn unlock(&self) -> Result<()> {
        if self
            .held
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("mutex: unlock of a mutex that is not locked");
            return Err(Error::invalid_argument("mutex is not locked"));
        }
        // Safety: `held` was set after `raw` was acquired and this call is
        // the only one that cleared it for that acquisition.
        unsafe { self.raw.unlock() };
        Ok(())
    }

    /// Whether some thread currently holds the mutex.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.is_locked())
            .finish()
    }
}
