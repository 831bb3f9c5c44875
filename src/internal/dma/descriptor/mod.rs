//! Hardware DMA descriptor.
//!
//! One descriptor per ring slot. Software fills in the buffer addresses and
//! lengths, then marks it pending; the device performs the transfer and
//! clears the `done` word.

pub mod bits;

use bits::{done, lengths};

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile to prevent compiler optimization
/// from reordering or caching descriptor field accesses.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: VolatileCell is safe to share between threads because all access
// is through volatile operations on naturally aligned words.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }
}

/// Loopback DMA descriptor (32 bytes).
#[repr(C)]
pub struct Descriptor {
    /// Completion sentinel: [`done::PENDING`] or [`done::COMPLETE`]
    done: VolatileCell<u32>,
    /// `in_len` in bits 0..16, `out_len` in bits 16..32
    lengths: VolatileCell<u32>,
    /// Reserved
    _reserved1: u32,
    /// Reserved
    _reserved2: u32,
    /// Device address of the source buffer
    in_addr: VolatileCell<u64>,
    /// Device address of the destination buffer
    out_addr: VolatileCell<u64>,
}

impl Descriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = 32;

    /// Create a new zeroed descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            done: VolatileCell::new(done::COMPLETE),
            lengths: VolatileCell::new(0),
            _reserved1: 0,
            _reserved2: 0,
            in_addr: VolatileCell::new(0),
            out_addr: VolatileCell::new(0),
        }
    }

    /// Describe an in-place transfer: source and destination are the same
    /// buffer. Does not hand the descriptor to hardware.
    pub fn prepare_in_place(&self, addr: u64, len: u16) {
        self.in_addr.set(addr);
        self.out_addr.set(addr);
        self.lengths.set(lengths::pack(len, len));
    }

    /// Mark the descriptor pending. Must follow [`Self::prepare_in_place`].
    #[inline(always)]
    pub fn set_pending(&self) {
        self.done.set(done::PENDING);
    }

    /// Check if hardware has completed the descriptor.
    #[inline(always)]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.get() == done::COMPLETE
    }

    /// Raw completion word, for diagnostics.
    #[inline(always)]
    #[must_use]
    pub fn raw_done(&self) -> u32 {
        self.done.get()
    }

    /// Source length in bytes
    #[inline(always)]
    #[must_use]
    pub fn in_len(&self) -> u16 {
        lengths::in_len(self.lengths.get())
    }

    /// Destination length in bytes
    #[inline(always)]
    #[must_use]
    pub fn out_len(&self) -> u16 {
        lengths::out_len(self.lengths.get())
    }

    /// Source device address
    #[inline(always)]
    #[must_use]
    pub fn in_addr(&self) -> u64 {
        self.in_addr.get()
    }

    /// Destination device address
    #[inline(always)]
    #[must_use]
    pub fn out_addr(&self) -> u64 {
        self.out_addr.get()
    }

    /// Zero every field.
    pub fn clear(&self) {
        self.in_addr.set(0);
        self.out_addr.set(0);
        self.lengths.set(0);
        self.done.set(done::COMPLETE);
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: Descriptor uses volatile cells for all DMA-accessed fields
unsafe impl Sync for Descriptor {}
unsafe impl Send for Descriptor {}
