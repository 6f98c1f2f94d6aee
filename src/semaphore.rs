// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named, cross-process counting semaphore.
// Delegates to platform::PlatformSemaphore (POSIX, Windows, or a stub).

use crate::error::{Error, Result};
use crate::platform::PlatformSemaphore;
use crate::shm_name::{platform_key, IpcObject};

/// How [`Semaphore::new`] treats an existing object with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemaphoreAccessMode {
    /// Set the count to the initial value, creating the object if needed.
    /// An existing object is kept and reset in place, so handles already
    /// open on it stay connected. This handle owns destruction.
    Create,
    /// Attach to an existing object, creating it if it is missing.
    Open,
}

/// A named, inter-process counting semaphore.
///
/// The OS name is derived from the logical name through
/// [`platform_key`]. The handle that created the object destroys it on drop;
/// [`take_ownership`](Semaphore::take_ownership) moves that duty to an
/// opener, e.g. after the creator crashed.
pub struct Semaphore {
    inner: PlatformSemaphore,
    name: String,
}

impl Semaphore {
    /// Create or open the semaphore `name`.
    ///
    /// `init_val` is applied when this call creates the object, and in
    /// [`Create`](SemaphoreAccessMode::Create) mode to an existing one.
    pub fn new(name: &str, init_val: u32, mode: SemaphoreAccessMode) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid_argument("semaphore name is empty"));
        }
        let key = platform_key(name, IpcObject::Semaphore)?;
        let (inner, _created) = PlatformSemaphore::open(&key, init_val, mode)?;
        Ok(Self {
            inner,
            name: name.to_string(),
        })
    }

    /// P operation: block until the count is positive, then decrement it.
    pub fn acquire(&self) -> Result<()> {
        self.inner.acquire()
    }

    /// V operation: increment the count, waking one blocked acquirer.
    pub fn release(&self) -> Result<()> {
        self.inner.release()
    }

    /// Make this handle responsible for destroying the object on drop.
    pub fn take_ownership(&self) {
        self.inner.take_ownership();
    }

    /// Whether dropping this handle destroys the object.
    pub fn is_owner(&self) -> bool {
        self.inner.is_owner()
    }

    /// Logical name this semaphore was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the named object without an open handle.
    pub fn clear_storage(name: &str) {
        if let Ok(key) = platform_key(name, IpcObject::Semaphore) {
            PlatformSemaphore::unlink_by_key(&key);
        }
    }
}
