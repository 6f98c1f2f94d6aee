// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Byte ring buffer laid out inside a named shared memory segment.
//
// Layout (native-endian, both processes must share word size):
//   [0, W)          read_pos
//   [W, 2W)         write_pos
//   [2W, size)      data, `capacity = size - 2W` bytes
// where W = size_of::<usize>(). read_pos == write_pos means empty; one slot
// always stays free so that a full buffer is distinguishable.
//
// Every operation holds the segment lock for its whole duration. This is a
// mutual-exclusion queue, not a lock-free one.

use std::ptr;

use crate::error::{Error, Result};
use crate::shm::{SharedMemory, ShmAccessPerms};
use crate::ShmGuard;

/// Offset of the data region from the start of the segment.
pub const SHM_BUFFER_DATA_OFFSET: usize = 2 * std::mem::size_of::<usize>();

/// A cross-process byte queue over shared memory.
pub struct ShmBuffer {
    shm: SharedMemory,
    capacity: usize,
}

impl ShmBuffer {
    /// Create a buffer able to hold at least `size` bytes, or attach to an
    /// existing one with `size == 0`.
    pub fn new(name: &str, size: usize) -> Result<Self> {
        let seg_size = if size == 0 {
            0
        } else {
            size.checked_add(SHM_BUFFER_DATA_OFFSET + 1)
                .ok_or_else(|| Error::invalid_argument("ring buffer size overflows"))?
        };
        let shm = SharedMemory::new(name, seg_size, ShmAccessPerms::ReadWrite)?;
        if shm.size() < SHM_BUFFER_DATA_OFFSET + 2 {
            return Err(Error::no_resources(
                "shared memory segment too small to hold a ring buffer",
            ));
        }
        let capacity = shm.size() - SHM_BUFFER_DATA_OFFSET;
        Ok(Self { shm, capacity })
    }

    /// Size of the data region. At most `capacity() - 1` bytes can be
    /// queued at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy up to `storage.len()` queued bytes out. Returns 0 when empty;
    /// never waits for data.
    pub fn read(&self, storage: &mut [u8]) -> Result<usize> {
        let ring = self.ring()?;
        let (r, w) = ring.positions()?;
        if r == w || storage.is_empty() {
            return Ok(0);
        }
        let n = ring.used(r, w).min(storage.len());
        let first = n.min(self.capacity - r);
        unsafe {
            ptr::copy_nonoverlapping(ring.data().add(r), storage.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(ring.data(), storage.as_mut_ptr().add(first), n - first);
        }
        ring.set_read_pos((r + n) % self.capacity);
        Ok(n)
    }

    /// Queue all of `data`, or nothing: returns 0 if it does not fit.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let ring = self.ring()?;
        let (r, w) = ring.positions()?;
        if data.is_empty() || ring.free(r, w) < data.len() {
            return Ok(0);
        }
        let n = data.len();
        let first = n.min(self.capacity - w);
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), ring.data().add(w), first);
            ptr::copy_nonoverlapping(data.as_ptr().add(first), ring.data(), n - first);
        }
        ring.set_write_pos((w + n) % self.capacity);
        Ok(n)
    }

    /// Bytes that can be written right now.
    pub fn free_space(&self) -> Result<usize> {
        let ring = self.ring()?;
        let (r, w) = ring.positions()?;
        Ok(ring.free(r, w))
    }

    /// Bytes waiting to be read.
    pub fn used_space(&self) -> Result<usize> {
        let ring = self.ring()?;
        let (r, w) = ring.positions()?;
        Ok(ring.used(r, w))
    }

    /// Zero the whole segment, header included.
    pub fn clear(&self) -> Result<()> {
        let ring = self.ring()?;
        unsafe { ptr::write_bytes(ring.base, 0, SHM_BUFFER_DATA_OFFSET + self.capacity) };
        Ok(())
    }

    /// Make this handle destroy the segment on drop.
    pub fn take_ownership(&self) {
        self.shm.take_ownership();
    }

    /// Remove a named ring buffer without an open handle.
    pub fn clear_storage(name: &str) {
        SharedMemory::clear_storage(name);
    }

    fn ring(&self) -> Result<Ring<'_>> {
        let guard = self.shm.guard()?;
        let base = self.shm.address();
        if base.is_null() {
            return Err(Error::invalid_argument("shared memory address is unavailable"));
        }
        Ok(Ring {
            base,
            capacity: self.capacity,
            _guard: guard,
        })
    }
}

/// Header and data access while the segment lock is held.
struct Ring<'a> {
    base: *mut u8,
    capacity: usize,
    _guard: ShmGuard<'a>,
}

impl Ring<'_> {
    fn data(&self) -> *mut u8 {
        unsafe { self.base.add(SHM_BUFFER_DATA_OFFSET) }
    }

    fn header(&self, idx: usize) -> *mut usize {
        // The mapping is page aligned, so both header words are aligned.
        unsafe { (self.base as *mut usize).add(idx) }
    }

    fn positions(&self) -> Result<(usize, usize)> {
        let (r, w) = unsafe { (self.header(0).read(), self.header(1).read()) };
        if r >= self.capacity || w >= self.capacity {
            return Err(Error::invalid_argument(format!(
                "corrupt ring buffer header (read {r}, write {w}, capacity {})",
                self.capacity
            )));
        }
        Ok((r, w))
    }

    fn set_read_pos(&self, pos: usize) {
        unsafe { self.header(0).write(pos) };
    }

    fn set_write_pos(&self, pos: usize) {
        unsafe { self.header(1).write(pos) };
    }

    fn used(&self, r: usize, w: usize) -> usize {
        if w >= r {
            w - r
        } else {
            self.capacity - (r - w)
        }
    }

    fn free(&self, r: usize, w: usize) -> usize {
        self.capacity - self.used(r, w) - 1
    }
}
