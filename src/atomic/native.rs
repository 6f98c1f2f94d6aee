// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Lock-free backend. Every operation is `SeqCst`.

use std::sync::atomic::{AtomicI32, AtomicI64, AtomicUsize, Ordering::SeqCst};

macro_rules! native_cell {
    ($(#[$meta:meta])* $name:ident, $atomic:ty, $int:ty) => {
        $(#[$meta])*
        #[repr(transparent)]
        pub struct $name {
            v: $atomic,
        }

        impl $name {
            pub const fn new(val: $int) -> Self {
                Self { v: <$atomic>::new(val) }
            }

            #[inline]
            pub fn get(&self) -> $int {
                self.v.load(SeqCst)
            }

            #[inline]
            pub fn set(&self, val: $int) {
                self.v.store(val, SeqCst)
            }

            /// Adds `val` (wrapping) and returns the previous value.
            #[inline]
            pub fn add(&self, val: $int) -> $int {
                self.v.fetch_add(val, SeqCst)
            }

            #[inline]
            pub fn inc(&self) {
                self.v.fetch_add(1, SeqCst);
            }

            /// Decrements and returns `true` if the new value is zero.
            #[inline]
            pub fn dec_and_test(&self) -> bool {
                self.v.fetch_sub(1, SeqCst) == 1
            }

            /// Single CAS attempt: stores `new` iff the cell holds `old`.
            #[inline]
            pub fn compare_and_exchange(&self, old: $int, new: $int) -> bool {
                self.v.compare_exchange(old, new, SeqCst, SeqCst).is_ok()
            }

            #[inline]
            pub fn and(&self, val: $int) -> $int {
                self.v.fetch_and(val, SeqCst)
            }

            #[inline]
            pub fn or(&self, val: $int) -> $int {
                self.v.fetch_or(val, SeqCst)
            }

            #[inline]
            pub fn xor(&self, val: $int) -> $int {
                self.v.fetch_xor(val, SeqCst)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }
    };
}

native_cell!(
    /// 32-bit signed atomic cell.
    AtomicInt, AtomicI32, i32
);
native_cell!(
    /// 64-bit signed atomic cell.
    AtomicInt64, AtomicI64, i64
);
native_cell!(
    /// Pointer-sized atomic cell.
    AtomicPointer, AtomicUsize, usize
);

/// The native backend always uses lock-free instructions.
pub const fn is_lock_free() -> bool {
    true
}
