//! Circular descriptor ring with per-slot software contexts.
//!
//! Slots cycle `FREE -> PENDING -> COMPLETED -> FREE`. The two transitions
//! software drives each have a single barrier site:
//!
//! - [`DescriptorRing::publish`] fills the descriptor, marks it pending, then
//!   fences before the tail register write that hands it to the device.
//! - [`DescriptorRing::observe`] checks the sentinel of the head slot, then
//!   fences before anything reads the slot's descriptor or payload.
//!
//! One slot always stays empty so that `tail == hw_head` means empty and
//! `next(tail) == hw_head` means full. A slot the device has finished still
//! belongs to software until it is retired, so the tail also stops one short
//! of the software head.

use alloc::vec::Vec;
use core::sync::atomic::{Ordering, fence};

use super::descriptor::Descriptor;
use super::table::DescriptorTable;
use crate::driver::error::{DmaError, IoError, IoResult};
use crate::hal::buffer::{DmaAddr, DmaBuffer};
use crate::hal::register::RegisterBus;
use crate::internal::register::device::DeviceRegs;

/// Descriptor ring plus the buffer each in-flight slot owns.
pub(crate) struct DescriptorRing {
    /// Hardware descriptors
    table: DescriptorTable,
    /// Buffer owned by each slot; `None` means the slot is free
    contexts: Vec<Option<DmaBuffer>>,
    /// Next slot to retire
    head: u32,
    /// Next slot to publish
    tail: u32,
}

impl DescriptorRing {
    /// Build a ring over `table` with every slot free.
    pub fn new(table: DescriptorTable) -> Self {
        let contexts = core::iter::repeat_with(|| None)
            .take(table.len() as usize)
            .collect();
        Self {
            table,
            contexts,
            head: 0,
            tail: 0,
        }
    }

    /// Ring depth
    #[inline(always)]
    pub const fn len(&self) -> u32 {
        self.table.len()
    }

    /// Software consumption cursor
    #[inline(always)]
    pub const fn head(&self) -> u32 {
        self.head
    }

    /// Software production cursor
    #[inline(always)]
    pub const fn tail(&self) -> u32 {
        self.tail
    }

    /// Device address of the descriptor table
    #[inline(always)]
    pub const fn base_addr(&self) -> DmaAddr {
        self.table.base_addr()
    }

    /// Descriptor at `index`
    #[inline]
    pub fn descriptor(&self, index: u32) -> &Descriptor {
        self.table.get(index)
    }

    #[inline(always)]
    const fn next(&self, index: u32) -> u32 {
        (index + 1) % self.table.len()
    }

    /// Check whether publishing one more slot would catch up with `hw_head`
    /// or with a completed slot that has not been retired yet.
    #[inline]
    pub fn is_full(&self, hw_head: u32) -> bool {
        let next = self.next(self.tail);
        next == hw_head || next == self.head || self.contexts[self.tail as usize].is_some()
    }

    /// Check whether the device has finished a slot software has not retired.
    #[inline]
    pub fn has_completed(&self, hw_head: u32) -> bool {
        self.head != hw_head
    }

    /// Slots the device has finished that are not yet retired.
    pub fn completed(&self, hw_head: u32) -> u32 {
        let len = self.len();
        (hw_head % len + len - self.head) % len
    }

    /// Slots published and not yet retired.
    pub fn in_flight(&self) -> u32 {
        let len = self.len();
        (self.tail + len - self.head) % len
    }

    /// Hand `buffer` to the device as an in-place transfer at the tail slot.
    ///
    /// The caller checks [`Self::is_full`] first. Returns the slot index, or
    /// the buffer untouched if its length does not fit a descriptor or the
    /// tail slot still owns a buffer.
    pub fn publish<B: RegisterBus>(
        &mut self,
        buffer: DmaBuffer,
        regs: &DeviceRegs<B>,
    ) -> Result<u32, (DmaError, DmaBuffer)> {
        let Ok(len) = u16::try_from(buffer.len()) else {
            return Err((DmaError::TransferTooLarge, buffer));
        };
        let slot = self.tail;
        if self.contexts[slot as usize].is_some() || self.next(slot) == self.head {
            return Err((DmaError::RingFull, buffer));
        }

        let desc = self.table.get(slot);
        desc.prepare_in_place(buffer.device_addr(), len);
        desc.set_pending();
        self.contexts[slot as usize] = Some(buffer);

        // Descriptor fields must reach memory before the device sees the tail.
        fence(Ordering::SeqCst);

        self.tail = self.next(slot);
        regs.set_queue_tail(self.tail);
        Ok(slot)
    }

    /// Confirm the head slot is done and order later reads after that check.
    ///
    /// The caller has already seen the hardware head move past this slot;
    /// a pending sentinel here is a protocol violation.
    pub fn observe(&self) -> IoResult<()> {
        if !self.table.get(self.head).is_done() {
            return Err(IoError::DescriptorNotDone);
        }
        // No descriptor or payload read may be satisfied before the sentinel.
        fence(Ordering::SeqCst);
        Ok(())
    }

    /// Free the head slot and take its buffer. Must follow [`Self::observe`].
    pub fn retire(&mut self) -> IoResult<DmaBuffer> {
        let slot = self.head;
        let buffer = self.contexts[slot as usize]
            .take()
            .ok_or(IoError::InvalidState)?;
        self.table.get(slot).clear();
        self.head = self.next(slot);
        Ok(buffer)
    }

    /// Take every buffer still owned by a slot and reset both cursors.
    ///
    /// Only valid once the device can no longer touch the ring.
    pub fn drain(&mut self) -> Vec<DmaBuffer> {
        let mut buffers = Vec::with_capacity(self.in_flight() as usize);
        for (slot, context) in self.contexts.iter_mut().enumerate() {
            if let Some(buffer) = context.take() {
                buffers.push(buffer);
            }
            self.table.get(slot as u32).clear();
        }
        self.head = 0;
        self.tail = 0;
        buffers
    }

    /// Dismantle the ring, returning the descriptor table.
    ///
    /// Call [`Self::drain`] first; any buffer still in a slot is dropped.
    pub fn into_table(self) -> DescriptorTable {
        self.table
    }
}
