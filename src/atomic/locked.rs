// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Mutex-emulated backend for targets without lock-free atomics.
// `xor` is a CAS loop over this backend's own compare-and-exchange.

use parking_lot::Mutex;

macro_rules! locked_cell {
    ($(#[$meta:meta])* $name:ident, $int:ty) => {
        $(#[$meta])*
        pub struct $name {
            v: Mutex<$int>,
        }

        impl $name {
            pub const fn new(val: $int) -> Self {
                Self { v: parking_lot::const_mutex(val) }
            }

            pub fn get(&self) -> $int {
                *self.v.lock()
            }

            pub fn set(&self, val: $int) {
                *self.v.lock() = val;
            }

            pub fn add(&self, val: $int) -> $int {
                let mut g = self.v.lock();
                let old = *g;
                *g = old.wrapping_add(val);
                old
            }

            pub fn inc(&self) {
                self.add(1);
            }

            pub fn dec_and_test(&self) -> bool {
                let mut g = self.v.lock();
                *g = g.wrapping_sub(1);
                *g == 0
            }

            pub fn compare_and_exchange(&self, old: $int, new: $int) -> bool {
                let mut g = self.v.lock();
                if *g != old {
                    return false;
                }
                *g = new;
                true
            }

            pub fn and(&self, val: $int) -> $int {
                let mut g = self.v.lock();
                let old = *g;
                *g = old & val;
                old
            }

            pub fn or(&self, val: $int) -> $int {
                let mut g = self.v.lock();
                let old = *g;
                *g = old | val;
                old
            }

            pub fn xor(&self, val: $int) -> $int {
                loop {
                    let old = self.get();
                    if self.compare_and_exchange(old, old ^ val) {
                        return old;
                    }
                }
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

locked_cell!(
    /// 32-bit signed atomic cell (mutex-emulated).
    AtomicInt, i32
);
locked_cell!(
    /// 64-bit signed atomic cell (mutex-emulated).
    AtomicInt64, i64
);
locked_cell!(
    /// Pointer-sized atomic cell (mutex-emulated).
    AtomicPointer, usize
);

pub const fn is_lock_free() -> bool {
    false
}
