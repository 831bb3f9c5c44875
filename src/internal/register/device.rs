//! Loopback DMA Device Register Definitions
//!
//! The device exposes a small, fixed register file: a reset register, an
//! interrupt enable, the descriptor ring base address (split into two 32-bit
//! halves), the ring depth, and the head/tail queue indices. The head index
//! is advanced by the device as it completes descriptors; the tail index is
//! advanced by software to hand descriptors to the device.

use super::{reg_ro, reg_rw, reg_wo};
use crate::hal::register::RegisterBus;
use crate::internal::constants::{DEVICE_RESET, INTERRUPTS_OFF, INTERRUPTS_ON};

// =============================================================================
// Register Offsets
// =============================================================================

/// Device Reset Register offset
pub const REG_DEV_RESET: usize = 0x00;
/// Interrupt Enable Register offset
pub const REG_INT_ENABLE: usize = 0x08;
/// Ring Base Address (low 32 bits) Register offset
pub const REG_RING_ADDR_LO: usize = 0x10;
/// Ring Base Address (high 32 bits) Register offset
pub const REG_RING_ADDR_HI: usize = 0x18;
/// Ring Size Register offset
pub const REG_RING_SIZE: usize = 0x20;
/// Queue Head Register offset (advanced by the device)
pub const REG_QUEUE_HEAD: usize = 0x28;
/// Queue Tail Register offset (advanced by software)
pub const REG_QUEUE_TAIL: usize = 0x30;

// =============================================================================
// Register Block
// =============================================================================

/// Typed accessors for the device register file.
#[derive(Debug)]
pub struct DeviceRegs<B> {
    bus: B,
}

impl<B: RegisterBus> DeviceRegs<B> {
    /// Wrap a register bus
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Underlying register bus
    #[inline(always)]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    reg_wo!(set_reset, REG_DEV_RESET, "Device Reset register");
    reg_rw!(
        interrupt_enable,
        set_interrupt_enable,
        REG_INT_ENABLE,
        "Interrupt Enable register"
    );
    reg_rw!(
        ring_addr_lo,
        set_ring_addr_lo,
        REG_RING_ADDR_LO,
        "Ring Base Address low register"
    );
    reg_rw!(
        ring_addr_hi,
        set_ring_addr_hi,
        REG_RING_ADDR_HI,
        "Ring Base Address high register"
    );
    reg_rw!(ring_size, set_ring_size, REG_RING_SIZE, "Ring Size register");
    reg_ro!(queue_head, REG_QUEUE_HEAD, "Queue Head register");
    reg_rw!(
        queue_tail,
        set_queue_tail,
        REG_QUEUE_TAIL,
        "Queue Tail register"
    );

    /// Reset the device
    #[inline]
    pub fn reset_device(&self) {
        self.set_reset(DEVICE_RESET);
    }

    /// Enable completion interrupts
    #[inline]
    pub fn enable_interrupts(&self) {
        self.set_interrupt_enable(INTERRUPTS_ON);
    }

    /// Disable all interrupts
    #[inline]
    pub fn disable_interrupts(&self) {
        self.set_interrupt_enable(INTERRUPTS_OFF);
    }

    /// Check whether completion interrupts are enabled
    #[inline]
    pub fn interrupts_enabled(&self) -> bool {
        self.interrupt_enable() != INTERRUPTS_OFF
    }

    /// Program the descriptor ring base address, high half first.
    pub fn set_ring_base(&self, addr: u64) {
        self.set_ring_addr_hi((addr >> 32) as u32);
        self.set_ring_addr_lo(addr as u32);
    }

    /// Read back the programmed descriptor ring base address
    pub fn ring_base(&self) -> u64 {
        ((self.ring_addr_hi() as u64) << 32) | self.ring_addr_lo() as u64
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::RecordingBus;

    #[test]
    fn register_offsets_are_distinct_and_aligned() {
        let offsets = [
            REG_DEV_RESET,
            REG_INT_ENABLE,
            REG_RING_ADDR_LO,
            REG_RING_ADDR_HI,
            REG_RING_SIZE,
            REG_QUEUE_HEAD,
            REG_QUEUE_TAIL,
        ];
        for (i, a) in offsets.iter().enumerate() {
            assert_eq!(a % 4, 0);
            for b in &offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn reset_writes_reset_value() {
        let regs = DeviceRegs::new(RecordingBus::new());
        regs.reset_device();
        assert_eq!(regs.bus().writes(), std::vec![(REG_DEV_RESET, DEVICE_RESET)]);
    }

    #[test]
    fn ring_base_writes_high_half_first() {
        let regs = DeviceRegs::new(RecordingBus::new());
        regs.set_ring_base(0x0000_0001_2345_6780);

        assert_eq!(
            regs.bus().writes(),
            std::vec![(REG_RING_ADDR_HI, 0x1), (REG_RING_ADDR_LO, 0x2345_6780)]
        );
        assert_eq!(regs.ring_base(), 0x0000_0001_2345_6780);
    }

    #[test]
    fn interrupt_enable_toggles() {
        let regs = DeviceRegs::new(RecordingBus::new());
        assert!(!regs.interrupts_enabled());
        regs.enable_interrupts();
        assert!(regs.interrupts_enabled());
        regs.disable_interrupts();
        assert!(!regs.interrupts_enabled());
    }

    #[test]
    fn tail_register_round_trips() {
        let regs = DeviceRegs::new(RecordingBus::new());
        regs.set_queue_tail(5);
        assert_eq!(regs.queue_tail(), 5);
    }

    #[test]
    fn head_register_reads_bus() {
        let bus = RecordingBus::new();
        bus.poke(REG_QUEUE_HEAD, 3);
        let regs = DeviceRegs::new(bus);
        assert_eq!(regs.queue_head(), 3);
    }
}
