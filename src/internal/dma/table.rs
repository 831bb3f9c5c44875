//! Descriptor table backed by device-visible memory.

use core::mem::align_of;

use super::descriptor::Descriptor;
use crate::driver::error::DmaError;
use crate::hal::buffer::{DmaAddr, DmaBuffer};

/// A contiguous array of `len` descriptors living in a [`DmaBuffer`].
///
/// The table owns its buffer; [`Self::into_buffer`] hands it back so it can
/// be returned to the allocator it came from.
#[derive(Debug)]
pub(crate) struct DescriptorTable {
    buffer: DmaBuffer,
    len: u32,
}

impl DescriptorTable {
    /// Bytes needed for a table of `len` descriptors
    #[inline]
    pub const fn bytes_for(len: u32) -> usize {
        len as usize * Descriptor::SIZE
    }

    /// Lay a table of `len` descriptors over `buffer` and clear them.
    ///
    /// On failure the buffer is returned untouched alongside the reason.
    pub fn new(buffer: DmaBuffer, len: u32) -> Result<Self, (DmaError, DmaBuffer)> {
        if len == 0 || buffer.len() < Self::bytes_for(len) {
            return Err((DmaError::InvalidLength, buffer));
        }
        if buffer.as_ptr() as usize % align_of::<Descriptor>() != 0
            || buffer.device_addr() % Descriptor::SIZE as u64 != 0
        {
            return Err((DmaError::Misaligned, buffer));
        }

        let table = Self { buffer, len };
        for i in 0..len {
            table.get(i).clear();
        }
        Ok(table)
    }

    /// Number of descriptors
    #[inline(always)]
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Device address of descriptor 0
    #[inline(always)]
    pub const fn base_addr(&self) -> DmaAddr {
        self.buffer.device_addr()
    }

    /// Descriptor at `index`. Panics if out of range.
    #[inline]
    pub fn get(&self, index: u32) -> &Descriptor {
        assert!(index < self.len, "descriptor index out of range");
        // SAFETY: the buffer holds at least `len` descriptors, is aligned for
        // them (checked in `new`), and lives as long as `self`. Every mutable
        // descriptor field is a VolatileCell, so shared references are sound
        // even while the device writes the same memory.
        unsafe { &*self.buffer.as_ptr().cast::<Descriptor>().add(index as usize) }
    }

    /// Give the backing buffer back.
    pub fn into_buffer(self) -> DmaBuffer {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::buffer::{DmaAllocator, HeapAllocator};

    #[test]
    fn bytes_for_is_descriptor_multiple() {
        assert_eq!(DescriptorTable::bytes_for(0), 0);
        assert_eq!(DescriptorTable::bytes_for(4), 128);
        assert_eq!(DescriptorTable::bytes_for(128), 4096);
    }

    #[test]
    fn new_clears_every_descriptor() {
        let mut heap = HeapAllocator::new();
        let mut buffer = heap.acquire(DescriptorTable::bytes_for(4)).unwrap();
        buffer.as_mut_slice().fill(0xAB);

        let table = DescriptorTable::new(buffer, 4).unwrap();
        assert_eq!(table.len(), 4);
        for i in 0..4 {
            assert!(table.get(i).is_done());
            assert_eq!(table.get(i).in_addr(), 0);
            assert_eq!(table.get(i).in_len(), 0);
        }

        heap.release(table.into_buffer());
        assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    fn descriptors_are_contiguous_at_base_address() {
        let mut heap = HeapAllocator::new();
        let buffer = heap.acquire(DescriptorTable::bytes_for(3)).unwrap();
        let base = buffer.as_ptr() as usize;

        let table = DescriptorTable::new(buffer, 3).unwrap();
        assert_eq!(table.base_addr(), base as u64);
        assert_eq!(table.get(2) as *const Descriptor as usize, base + 64);

        heap.release(table.into_buffer());
    }

    #[test]
    fn undersized_buffer_is_returned() {
        let mut heap = HeapAllocator::new();
        let buffer = heap.acquire(DescriptorTable::bytes_for(4) - 1).unwrap();

        let (err, buffer) = DescriptorTable::new(buffer, 4).unwrap_err();
        assert_eq!(err, DmaError::InvalidLength);

        heap.release(buffer);
        assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    #[should_panic(expected = "descriptor index out of range")]
    fn get_past_end_panics() {
        let mut heap = HeapAllocator::new();
        let buffer = heap.acquire(DescriptorTable::bytes_for(2)).unwrap();
        let table = DescriptorTable::new(buffer, 2).unwrap();
        let _ = table.get(2);
    }
}
