//! Register Bus HAL
//!
//! The driver core never touches a register address directly. It goes through
//! a [`RegisterBus`], which maps a register offset to a 32-bit read or write.
//! [`Mmio`] is the bus for a real memory-mapped register window; a simulated
//! device can implement the same trait for host testing.
//!
//! Register accesses are barrier-agnostic. Ordering against descriptor memory
//! is established by the descriptor ring at its publish and observe points.

use crate::internal::register::{read_reg, write_reg};

/// Access to a block of 32-bit device registers addressed by byte offset.
pub trait RegisterBus {
    /// Read the register at `offset`
    fn read32(&self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`
    fn write32(&self, offset: usize, value: u32);
}

impl<T: RegisterBus + ?Sized> RegisterBus for &T {
    #[inline(always)]
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    #[inline(always)]
    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value);
    }
}

/// Memory-mapped register window.
///
/// Every access is a volatile 32-bit load or store at `base + offset`.
#[derive(Debug)]
pub struct Mmio {
    base: *mut u8,
}

impl Mmio {
    /// Create a register bus over the window starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to the device's mapped register window, be 4-byte
    /// aligned, and stay mapped for as long as the bus is used. The window
    /// must cover every register offset the driver touches (up to `0x34`).
    #[must_use]
    pub const unsafe fn new(base: *mut u8) -> Self {
        Self { base }
    }

    /// Base address of the register window
    #[inline(always)]
    #[must_use]
    pub const fn base(&self) -> *mut u8 {
        self.base
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: `Mmio::new` requires the window to cover all driver offsets.
        unsafe { read_reg(self.base.wrapping_add(offset)) }
    }

    #[inline(always)]
    fn write32(&self, offset: usize, value: u32) {
        // SAFETY: `Mmio::new` requires the window to cover all driver offsets.
        unsafe { write_reg(self.base.wrapping_add(offset), value) }
    }
}

// SAFETY: Register accesses are single volatile word operations; the device
// window is not tied to the thread that mapped it.
unsafe impl Send for Mmio {}
