//! Register definitions for the loopback DMA device
//!
//! This module provides type-safe access to the device's control and status
//! registers. All register access is volatile to ensure proper hardware
//! interaction.

pub mod device;

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: *const u8) -> u32 {
    unsafe { core::ptr::read_volatile(addr.cast::<u32>()) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: *mut u8, value: u32) {
    unsafe { core::ptr::write_volatile(addr.cast::<u32>(), value) }
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods for a register.
///
/// # Example
/// ```ignore
/// impl<B: RegisterBus> DeviceRegs<B> {
///     reg_rw!(ring_size, set_ring_size, REG_RING_SIZE, "Ring Size register");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read32($offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write32($offset, value);
        }
    };
}

/// Generate a read-only accessor method for a register.
macro_rules! reg_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read32($offset)
        }
    };
}

/// Generate a write-only accessor method for a register.
macro_rules! reg_wo {
    ($write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write32($offset, value);
        }
    };
}

// Export macros for use in submodules
pub(crate) use reg_ro;
pub(crate) use reg_rw;
pub(crate) use reg_wo;
