// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Busy-wait mutual exclusion over an atomic flag (0 = unlocked, 1 = locked).
// Falls back to a real mutex when the atomic backend is not lock-free.

use log::warn;
use parking_lot::lock_api::RawMutex as _;

use crate::atomic::{self, AtomicInt};

/// Adaptive backoff used by every spinning primitive in the crate.
///
/// - k < 4:  busy spin
/// - k < 16: CPU pause hint
/// - k < 32: thread yield
/// - k >= 32: sleep 1ms
#[inline]
pub(crate) fn adaptive_yield(k: &mut u32) {
    if *k < 4 {
        // busy spin
    } else if *k < 16 {
        std::hint::spin_loop();
    } else if *k < 32 {
        std::thread::yield_now();
    } else {
        std::thread::sleep(std::time::Duration::from_millis(1));
        return;
    }
    *k += 1;
}

/// CAS(0 → 1) spinning backend.
pub(crate) struct CasSpin {
    lc: AtomicInt,
}

impl CasSpin {
    pub(crate) const fn new() -> Self {
        Self {
            lc: AtomicInt::new(0),
        }
    }

    pub(crate) fn lock(&self) {
        let mut k = 0u32;
        while !self.lc.compare_and_exchange(0, 1) {
            adaptive_yield(&mut k);
        }
    }

    pub(crate) fn trylock(&self) -> bool {
        self.lc.compare_and_exchange(0, 1)
    }

    /// Plain store, not a CAS: unlocking an unlocked lock is harmless.
    pub(crate) fn unlock(&self) {
        self.lc.set(0);
    }
}

/// Mutex-backed backend: blocks in the kernel instead of spinning.
pub(crate) struct MutexSpin {
    raw: parking_lot::RawMutex,
}

impl MutexSpin {
    pub(crate) const fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
        }
    }

    pub(crate) fn lock(&self) {
        self.raw.lock();
    }

    pub(crate) fn trylock(&self) -> bool {
        self.raw.try_lock()
    }

    pub(crate) fn unlock(&self) {
        if !self.raw.is_locked() {
            warn!("spin lock: unlock of an unlocked mutex-backed lock ignored");
            return;
        }
        // Safety: the lock is held; ownership is not tracked per thread.
        unsafe { self.raw.unlock() };
    }
}

enum Backend {
    Cas(CasSpin),
    Mutex(MutexSpin),
}

/// A spin lock.
///
/// At most one thread holds it at a time. There is no owner check on
/// [`unlock`](SpinLock::unlock) and no recursion counter: locking twice from
/// the same thread deadlocks.
pub struct SpinLock {
    inner: Backend,
}

impl SpinLock {
    /// Create a new unlocked spin lock.
    pub const fn new() -> Self {
        let inner = if atomic::is_lock_free() {
            Backend::Cas(CasSpin::new())
        } else {
            Backend::Mutex(MutexSpin::new())
        };
        Self { inner }
    }

    /// Acquire the lock, spinning with adaptive backoff.
    pub fn lock(&self) {
        match &self.inner {
            Backend::Cas(s) => s.lock(),
            Backend::Mutex(m) => m.lock(),
        }
    }

    /// Single acquisition attempt.
    pub fn trylock(&self) -> bool {
        match &self.inner {
            Backend::Cas(s) => s.trylock(),
            Backend::Mutex(m) => m.trylock(),
        }
    }

    /// Release the lock.
    pub fn unlock(&self) {
        match &self.inner {
            Backend::Cas(s) => s.unlock(),
            Backend::Mutex(m) => m.unlock(),
        }
    }

    /// Whether this lock spins (`true`) or blocks on a mutex (`false`).
    pub fn is_spinning(&self) -> bool {
        matches!(self.inner, Backend::Cas(_))
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}
