// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Condition variable paired with `Mutex`.
// native:   parking_lot_core park/unpark keyed by the condvar address.
// emulated: owned FIFO of waiter records guarded by a SpinLock, each with an
//           explicit signal flag so a wake between unlock and park is kept.

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};

use log::warn;
use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

use crate::error::{Error, Result};
use crate::{runtime, Mutex, SpinLock};

/// Condition variable implementation choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CondvarBackend {
    /// Parking-lot wait queues provided by the runtime.
    Native,
    /// FIFO queue of parked threads guarded by a spin lock.
    Emulated,
}

pub(crate) trait CondBackend: Send + Sync {
    /// Caller holds `mtx`. Registers, unlocks, parks, re-locks.
    fn wait(&self, mtx: &Mutex) -> Result<()>;
    fn signal(&self);
    fn broadcast(&self);
    fn waiters(&self) -> usize;
}

/// A condition variable.
///
/// Usage follows the classic pattern: lock the mutex, loop on the predicate
/// calling [`wait`](CondVar::wait), unlock. Wakeups may be spurious, wake
/// order is unspecified, and a signal sent while nobody waits is lost.
pub struct CondVar {
    inner: Box<dyn CondBackend>,
    backend: CondvarBackend,
}

impl CondVar {
    /// Create a condition variable using the runtime's configured backend.
    pub fn new() -> Self {
        Self::with_backend(runtime::capabilities().condvar)
    }

    pub fn with_backend(backend: CondvarBackend) -> Self {
        let inner: Box<dyn CondBackend> = match backend {
            CondvarBackend::Native => Box::new(ParkingCond::new()),
            CondvarBackend::Emulated => Box::new(QueueCond::new()),
        };
        Self { inner, backend }
    }

    /// Block until signalled. The caller must hold `mtx`; it is released
    /// while parked and held again when this returns, on every path.
    ///
    /// Fails with `InvalidArgument` if `mtx` is not locked on entry.
    pub fn wait(&self, mtx: &Mutex) -> Result<()> {
        if !mtx.is_locked() {
            return Err(Error::invalid_argument("condvar wait: mutex is not locked"));
        }
        self.inner.wait(mtx)
    }

    /// Wake at most one waiter.
    pub fn signal(&self) {
        self.inner.signal();
    }

    /// Wake every current waiter.
    pub fn broadcast(&self) {
        self.inner.broadcast();
    }

    /// Number of threads currently registered as waiting.
    pub fn waiters(&self) -> usize {
        self.inner.waiters()
    }

    pub fn backend(&self) -> CondvarBackend {
        self.backend
    }
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CondVar {
    fn drop(&mut self) {
        let n = self.inner.waiters();
        if n > 0 {
            warn!("condvar dropped with {n} thread(s) still waiting; they stay parked");
        }
    }
}

// ---------------------------------------------------------------------------
// Native backend
// ---------------------------------------------------------------------------

struct ParkingCond {
    waiters: AtomicUsize,
}

impl ParkingCond {
    fn new() -> Self {
        Self {
            waiters: AtomicUsize::new(0),
        }
    }

    fn key(&self) -> usize {
        self as *const Self as usize
    }
}

impl CondBackend for ParkingCond {
    fn wait(&self, mtx: &Mutex) -> Result<()> {
        self.waiters.fetch_add(1, Ordering::SeqCst);
        let mut unlocked = Ok(());
        // Safety: the key is this object's address, which stays valid while
        // any thread is parked on it; the callbacks do not panic or park.
        unsafe {
            parking_lot_core::park(
                self.key(),
                || true,
                || unlocked = mtx.unlock(),
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                None,
            );
        }
        self.waiters.fetch_sub(1, Ordering::SeqCst);
        unlocked?;
        mtx.lock();
        Ok(())
    }

    fn signal(&self) {
        // Safety: see `wait`.
        unsafe {
            parking_lot_core::unpark_one(self.key(), |_| DEFAULT_UNPARK_TOKEN);
        }
    }

    fn broadcast(&self) {
        // Safety: see `wait`.
        unsafe {
            parking_lot_core::unpark_all(self.key(), DEFAULT_UNPARK_TOKEN);
        }
    }

    fn waiters(&self) -> usize {
        self.waiters.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Emulated backend
// ---------------------------------------------------------------------------

struct WaiterRecord {
    thread: Thread,
    signaled: AtomicBool,
}

impl WaiterRecord {
    fn wake(&self) {
        self.signaled.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

struct QueueCond {
    lock: SpinLock,
    queue: UnsafeCell<VecDeque<Arc<WaiterRecord>>>,
}

// Safety: `queue` is only touched inside `with_queue`, under `lock`.
unsafe impl Send for QueueCond {}
unsafe impl Sync for QueueCond {}

impl QueueCond {
    fn new() -> Self {
        Self {
            lock: SpinLock::new(),
            queue: UnsafeCell::new(VecDeque::new()),
        }
    }

    fn with_queue<R>(&self, f: impl FnOnce(&mut VecDeque<Arc<WaiterRecord>>) -> R) -> R {
        self.lock.lock();
        let r = f(unsafe { &mut *self.queue.get() });
        self.lock.unlock();
        r
    }
}

impl CondBackend for QueueCond {
    fn wait(&self, mtx: &Mutex) -> Result<()> {
        let rec = Arc::new(WaiterRecord {
            thread: thread::current(),
            signaled: AtomicBool::new(false),
        });
        self.with_queue(|q| q.push_back(Arc::clone(&rec)));

        if let Err(e) = mtx.unlock() {
            self.with_queue(|q| q.retain(|w| !Arc::ptr_eq(w, &rec)));
            return Err(e);
        }

        while !rec.signaled.load(Ordering::Acquire) {
            thread::park();
        }
        mtx.lock();
        Ok(())
    }

    fn signal(&self) {
        if let Some(rec) = self.with_queue(|q| q.pop_front()) {
            rec.wake();
        }
    }

    fn broadcast(&self) {
        let woken: Vec<_> = self.with_queue(|q| q.drain(..).collect());
        for rec in woken {
            rec.wake();
        }
    }

    fn waiters(&self) -> usize {
        self.with_queue(|q| q.len())
    }
}
