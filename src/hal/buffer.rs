//! DMA Buffer Allocator HAL
//!
//! Transfers and the descriptor table live in device-visible memory obtained
//! from a [`DmaAllocator`]. Each allocation is a [`DmaBuffer`]: a CPU pointer
//! paired with the address the device uses for the same bytes.
//!
//! A `DmaBuffer` is not `Clone`. Acquiring one moves it to the caller, handing
//! it to a ring slot moves it into the slot, and releasing it consumes it, so
//! a buffer has exactly one owner at any time and cannot be released twice.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::driver::error::{DmaError, DmaResult};
use crate::internal::constants::DMA_ALIGN;

/// Address of a buffer as seen by the device.
pub type DmaAddr = u64;

// =============================================================================
// Addressing Capability
// =============================================================================

/// Width of the device's DMA address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaMask {
    /// Device can address the low 4 GiB only
    Bits32,
    /// Device can address the full 64-bit space
    #[default]
    Bits64,
}

impl DmaMask {
    /// Number of address bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            DmaMask::Bits32 => 32,
            DmaMask::Bits64 => 64,
        }
    }

    /// Highest addressable byte
    #[must_use]
    pub const fn limit(self) -> u64 {
        match self {
            DmaMask::Bits32 => u32::MAX as u64,
            DmaMask::Bits64 => u64::MAX,
        }
    }

    /// Check whether `[addr, addr + len)` lies inside the addressable range.
    #[must_use]
    pub const fn covers(self, addr: DmaAddr, len: usize) -> bool {
        if len == 0 {
            return addr <= self.limit();
        }
        match addr.checked_add(len as u64 - 1) {
            Some(last) => last <= self.limit(),
            None => false,
        }
    }

    /// The next narrower mask to fall back to, if any.
    #[must_use]
    pub const fn narrower(self) -> Option<DmaMask> {
        match self {
            DmaMask::Bits64 => Some(DmaMask::Bits32),
            DmaMask::Bits32 => None,
        }
    }
}

// =============================================================================
// DMA Buffer
// =============================================================================

/// A device-visible memory region paired with its device address.
#[derive(Debug)]
pub struct DmaBuffer {
    ptr: NonNull<u8>,
    addr: DmaAddr,
    size: usize,
}

impl DmaBuffer {
    /// Assemble a buffer from its parts.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `size` bytes for as long as
    /// the buffer exists, must not be aliased by any other live `DmaBuffer`,
    /// and `addr` must be the device address of the same bytes.
    #[must_use]
    pub const unsafe fn from_raw_parts(ptr: NonNull<u8>, addr: DmaAddr, size: usize) -> Self {
        Self { ptr, addr, size }
    }

    /// Split the buffer back into `(ptr, device address, size)`.
    #[must_use]
    pub const fn into_raw_parts(self) -> (NonNull<u8>, DmaAddr, usize) {
        (self.ptr, self.addr, self.size)
    }

    /// Device address of the first byte
    #[inline(always)]
    pub const fn device_addr(&self) -> DmaAddr {
        self.addr
    }

    /// CPU pointer to the first byte
    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Size in bytes
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Check whether the buffer is zero-sized
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// View the contents.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `from_raw_parts` guarantees `size` valid, unaliased bytes.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    /// Mutably view the contents.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `from_raw_parts` guarantees `size` valid, unaliased bytes.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }
}

// SAFETY: a DmaBuffer is the sole owner of its region.
unsafe impl Send for DmaBuffer {}

// =============================================================================
// Allocator Trait
// =============================================================================

/// Source of device-visible, physically contiguous memory.
pub trait DmaAllocator {
    /// Constrain future allocations to `mask`.
    ///
    /// Fails with [`DmaError::AddressOutOfRange`] if the platform cannot
    /// guarantee addresses inside `mask`.
    fn set_mask(&mut self, mask: DmaMask) -> DmaResult<()>;

    /// Allocate exactly `size` zeroed bytes.
    ///
    /// Fails with [`DmaError::OutOfMemory`] if the request cannot be
    /// satisfied. A later retry is not guaranteed to succeed.
    fn acquire(&mut self, size: usize) -> DmaResult<DmaBuffer>;

    /// Return a buffer obtained from [`Self::acquire`] on this allocator.
    fn release(&mut self, buffer: DmaBuffer);
}

impl<T: DmaAllocator + ?Sized> DmaAllocator for &mut T {
    fn set_mask(&mut self, mask: DmaMask) -> DmaResult<()> {
        (**self).set_mask(mask)
    }

    fn acquire(&mut self, size: usize) -> DmaResult<DmaBuffer> {
        (**self).acquire(size)
    }

    fn release(&mut self, buffer: DmaBuffer) {
        (**self).release(buffer);
    }
}

// =============================================================================
// Heap Allocator
// =============================================================================

/// Allocator for cache-coherent, identity-mapped memory.
///
/// Draws from the global heap and reports each buffer's CPU address as its
/// device address. This matches targets where the DMA master sees internal
/// RAM at the CPU's addresses, and host-side device simulators.
#[derive(Debug)]
pub struct HeapAllocator {
    /// Widest address any heap pointer can have on this platform
    reach: DmaMask,
    /// Mask negotiated with the device
    mask: DmaMask,
    /// Upper bound on outstanding bytes, if any
    budget: Option<usize>,
    /// Bytes currently handed out
    outstanding: usize,
}

impl HeapAllocator {
    /// Create an allocator with no budget.
    #[must_use]
    pub const fn new() -> Self {
        let reach = if usize::BITS <= 32 {
            DmaMask::Bits32
        } else {
            DmaMask::Bits64
        };
        Self {
            reach,
            mask: reach,
            budget: None,
            outstanding: 0,
        }
    }

    /// Limit the number of bytes that may be outstanding at once.
    #[must_use]
    pub const fn with_budget(mut self, bytes: usize) -> Self {
        self.budget = Some(bytes);
        self
    }

    /// Bytes currently handed out
    #[inline]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Currently negotiated mask
    #[inline]
    pub const fn mask(&self) -> DmaMask {
        self.mask
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaAllocator for HeapAllocator {
    fn set_mask(&mut self, mask: DmaMask) -> DmaResult<()> {
        if self.reach.limit() > mask.limit() {
            return Err(DmaError::AddressOutOfRange);
        }
        self.mask = mask;
        Ok(())
    }

    fn acquire(&mut self, size: usize) -> DmaResult<DmaBuffer> {
        if size == 0 {
            return Err(DmaError::InvalidLength);
        }
        if let Some(budget) = self.budget
            && self.outstanding + size > budget
        {
            return Err(DmaError::OutOfMemory);
        }

        let layout = Layout::from_size_align(size, DMA_ALIGN).map_err(|_| DmaError::OutOfMemory)?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(DmaError::OutOfMemory)?;

        let addr = ptr.as_ptr() as usize as DmaAddr;
        if !self.mask.covers(addr, size) {
            // SAFETY: `raw` was just allocated with `layout`.
            unsafe { alloc::alloc::dealloc(raw, layout) };
            return Err(DmaError::AddressOutOfRange);
        }

        self.outstanding += size;
        // SAFETY: fresh allocation of `size` bytes, identity-mapped.
        Ok(unsafe { DmaBuffer::from_raw_parts(ptr, addr, size) })
    }

    fn release(&mut self, buffer: DmaBuffer) {
        let (ptr, _, size) = buffer.into_raw_parts();
        // Acquire only hands out layouts that passed this check.
        let Ok(layout) = Layout::from_size_align(size, DMA_ALIGN) else {
            return;
        };
        // SAFETY: the buffer came from `acquire` on this allocator with the
        // same size and alignment, and ownership ends here.
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) };
        self.outstanding -= size;
    }
}
