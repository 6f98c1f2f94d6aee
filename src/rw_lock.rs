// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Single-word atomic read-write lock using bit flags.
// - High bit (W_FLAG) marks the exclusive/write lock.
// - Low bits count concurrent shared/read locks.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::spin_lock::adaptive_yield;

const W_MASK: u32 = i32::MAX as u32; // reader count
const W_FLAG: u32 = W_MASK + 1; // writer bit

/// A single-word read-write lock.
///
/// Writers get exclusive access, multiple readers can hold the lock
/// concurrently. A writer announces itself by setting the writer bit, which
/// stops new readers, and then waits for the active readers to drain.
pub struct RwLock {
    lc: AtomicU32,
}

impl RwLock {
    /// Create a new unlocked read-write lock.
    pub const fn new() -> Self {
        Self {
            lc: AtomicU32::new(0),
        }
    }

    /// Acquire a shared (read) lock.
    pub fn reader_lock(&self) {
        let mut k = 0u32;
        loop {
            let old = self.lc.load(Ordering::Acquire);
            if old & W_FLAG != 0 {
                adaptive_yield(&mut k);
                continue;
            }
            if self
                .lc
                .compare_exchange_weak(old, old + 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Try to acquire a shared lock; fails if a writer is active or pending.
    pub fn reader_trylock(&self) -> bool {
        let mut old = self.lc.load(Ordering::Acquire);
        loop {
            if old & W_FLAG != 0 || old & W_MASK == W_MASK {
                return false;
            }
            match self
                .lc
                .compare_exchange_weak(old, old + 1, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(cur) => old = cur,
            }
        }
    }

    /// Release a shared lock.
    pub fn reader_unlock(&self) {
        self.lc.fetch_sub(1, Ordering::Release);
    }

    /// Acquire the exclusive (write) lock.
    pub fn writer_lock(&self) {
        let mut k = 0u32;
        loop {
            let old = self.lc.fetch_or(W_FLAG, Ordering::AcqRel);
            if old == 0 {
                return; // no readers, no writer
            }
            if old & W_FLAG == 0 {
                break; // readers present; we own the flag now
            }
            adaptive_yield(&mut k);
        }
        let mut k = 0u32;
        while self.lc.load(Ordering::Acquire) & W_MASK != 0 {
            adaptive_yield(&mut k);
        }
    }

    /// Try to acquire the write lock; only succeeds on a fully idle lock.
    pub fn writer_trylock(&self) -> bool {
        self.lc
            .compare_exchange(0, W_FLAG, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Release the write lock.
    pub fn writer_unlock(&self) {
        self.lc.store(0, Ordering::Release);
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}
