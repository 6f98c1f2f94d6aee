// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Portable system primitives: atomics, locks, condition variables, named
// semaphores, shared memory with a ring buffer on top, and ordered trees.
// One contract per primitive, one backend module per platform.

mod error;
pub use error::{error_from_system, Error, ErrorKind, IpcErrorKind, Result};

pub mod runtime;
pub use runtime::Capabilities;

pub mod atomic;

mod spin_lock;
pub use spin_lock::SpinLock;

mod mutex;
pub use mutex::Mutex;

mod rw_lock;
pub use rw_lock::RwLock;

mod condition;
pub use condition::{CondVar, CondvarBackend};

pub mod digest;
pub use digest::{DigestEngine, DigestKind};

pub mod shm_name;

mod platform;

mod semaphore;
pub use semaphore::{Semaphore, SemaphoreAccessMode};

mod shm;
pub use shm::{SharedMemory, ShmAccessPerms};

mod scoped_access;
pub use scoped_access::ShmGuard;

mod shm_buffer;
pub use shm_buffer::{ShmBuffer, SHM_BUFFER_DATA_OFFSET};

mod tree;
pub use tree::{Tree, TreeKind};
