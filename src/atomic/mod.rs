// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Sequentially consistent atomic cells with one contract and two backends:
// - native: compiler intrinsics via `std::sync::atomic` (lock-free)
// - locked: every cell guarded by a mutex, for targets without native atomics
//
// The backend is picked at build time; both modules are always compiled
// where the target allows so their contract can be exercised side by side.

pub mod locked;

#[cfg(all(target_has_atomic = "ptr", target_has_atomic = "64"))]
pub mod native;

#[cfg(all(
    target_has_atomic = "ptr",
    target_has_atomic = "64",
    not(feature = "emulated-atomics")
))]
pub use native::{is_lock_free, AtomicInt, AtomicInt64, AtomicPointer};

#[cfg(not(all(
    target_has_atomic = "ptr",
    target_has_atomic = "64",
    not(feature = "emulated-atomics")
)))]
pub use locked::{is_lock_free, AtomicInt, AtomicInt64, AtomicPointer};
