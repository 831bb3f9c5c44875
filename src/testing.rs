//! Test doubles for host-side unit tests.
//!
//! - [`RecordingBus`]: register bus that remembers every write
//! - [`SimDevice`]: a software loopback device behind the register bus
//! - [`MockDelay`]: `DelayNs` that only counts, with an optional per-tick hook
//! - [`TrackingAllocator`]: heap allocator with failure injection and
//!   exactly-once release checks

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::driver::error::{DmaError, DmaResult};
use crate::hal::buffer::{DmaAddr, DmaAllocator, DmaBuffer, DmaMask, HeapAllocator};
use crate::hal::register::RegisterBus;
use crate::internal::dma::descriptor::Descriptor;
use crate::internal::dma::descriptor::bits::done;
use crate::internal::register::device::{
    REG_DEV_RESET, REG_QUEUE_HEAD, REG_QUEUE_TAIL, REG_RING_ADDR_HI, REG_RING_ADDR_LO,
    REG_RING_SIZE,
};

const WINDOW_WORDS: usize = 16;

// =============================================================================
// Recording Bus
// =============================================================================

/// Register bus backed by plain memory that logs every write.
///
/// Reads return the last value written (or poked), zero by default.
#[derive(Debug, Default)]
pub struct RecordingBus {
    words: [Cell<u32>; WINDOW_WORDS],
    writes: RefCell<Vec<(usize, u32)>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(offset, value)` written, in order
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.borrow().clone()
    }

    /// Set a register as the device would, without logging a write
    pub fn poke(&self, offset: usize, value: u32) {
        self.words[offset / 4].set(value);
    }
}

impl RegisterBus for RecordingBus {
    fn read32(&self, offset: usize) -> u32 {
        self.words[offset / 4].get()
    }

    fn write32(&self, offset: usize, value: u32) {
        self.writes.borrow_mut().push((offset, value));
        self.words[offset / 4].set(value);
    }
}

// =============================================================================
// Simulated Device
// =============================================================================

#[derive(Debug, Default)]
struct SimState {
    words: [u32; WINDOW_WORDS],
    writes: Vec<(usize, u32)>,
    head: u32,
    tail: u32,
    resets: u32,
    ring_size_readback: Option<u32>,
    transform: Option<fn(&mut [u8])>,
}

/// Loopback device model.
///
/// Clones share one device, so a test can keep a handle while the engine owns
/// another. Descriptor and payload addresses are taken to be identity-mapped,
/// which holds for buffers from [`HeapAllocator`].
#[derive(Debug, Clone, Default)]
pub struct SimDevice {
    state: Rc<RefCell<SimState>>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the ring size register read back `value` regardless of writes
    pub fn with_ring_size_readback(self, value: u32) -> Self {
        self.state.borrow_mut().ring_size_readback = Some(value);
        self
    }

    /// Apply `f` to each payload the device completes
    pub fn with_transform(self, f: fn(&mut [u8])) -> Self {
        self.state.borrow_mut().transform = Some(f);
        self
    }

    pub fn head(&self) -> u32 {
        self.state.borrow().head
    }

    pub fn tail(&self) -> u32 {
        self.state.borrow().tail
    }

    pub fn resets(&self) -> u32 {
        self.state.borrow().resets
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.state.borrow().writes.clone()
    }

    pub fn register(&self, offset: usize) -> u32 {
        self.read32(offset)
    }

    /// Descriptors published but not yet completed
    pub fn pending(&self) -> u32 {
        let s = self.state.borrow();
        let size = s.words[REG_RING_SIZE / 4].max(1);
        (s.tail + size - s.head) % size
    }

    fn descriptor(&self, index: u32) -> *mut Descriptor {
        let s = self.state.borrow();
        let base = ((s.words[REG_RING_ADDR_HI / 4] as u64) << 32)
            | s.words[REG_RING_ADDR_LO / 4] as u64;
        (base as usize as *mut Descriptor).wrapping_add(index as usize)
    }

    fn advance_head(&self) {
        let mut s = self.state.borrow_mut();
        s.head = (s.head + 1) % s.words[REG_RING_SIZE / 4];
    }

    /// Process up to `n` pending descriptors; returns how many were done.
    pub fn complete(&self, n: u32) -> u32 {
        let count = n.min(self.pending());
        let transform = self.state.borrow().transform;
        for _ in 0..count {
            let ptr = self.descriptor(self.head());
            // SAFETY: the engine under test owns the table and payload
            // buffers and keeps them alive while descriptors are pending.
            unsafe {
                let desc = &*ptr;
                if let Some(f) = transform {
                    let payload = core::slice::from_raw_parts_mut(
                        desc.in_addr() as usize as *mut u8,
                        desc.in_len() as usize,
                    );
                    f(payload);
                }
                core::ptr::write_volatile(ptr.cast::<u32>(), done::COMPLETE);
            }
            self.advance_head();
        }
        count
    }

    /// Process every pending descriptor
    pub fn complete_all(&self) -> u32 {
        self.complete(u32::MAX)
    }

    /// Advance the head register without touching descriptor memory
    pub fn advance_head_without_completing(&self) {
        self.advance_head();
    }

    /// Sentinel word of descriptor `index`
    pub fn done_word(&self, index: u32) -> u32 {
        // SAFETY: see `complete`.
        unsafe { (*self.descriptor(index)).raw_done() }
    }
}

impl RegisterBus for SimDevice {
    fn read32(&self, offset: usize) -> u32 {
        let s = self.state.borrow();
        match offset {
            REG_QUEUE_HEAD => s.head,
            REG_QUEUE_TAIL => s.tail,
            REG_RING_SIZE => s.ring_size_readback.unwrap_or(s.words[offset / 4]),
            _ => s.words[offset / 4],
        }
    }

    fn write32(&self, offset: usize, value: u32) {
        let mut s = self.state.borrow_mut();
        s.writes.push((offset, value));
        match offset {
            REG_DEV_RESET => {
                s.resets += 1;
                s.head = 0;
                s.tail = 0;
            }
            REG_QUEUE_TAIL => s.tail = value,
            REG_QUEUE_HEAD => return,
            _ => {}
        }
        s.words[offset / 4] = value;
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

type Hook<'h> = Box<dyn FnMut(u32) + 'h>;

/// Mock delay that records time without waiting.
///
/// A hook, if set, runs after every delay call with the running tick count;
/// tests use it to complete descriptors while a reclaim is blocked.
#[derive(Default)]
pub struct MockDelay<'h> {
    total_ns: u64,
    ticks: u32,
    hook: Option<Hook<'h>>,
}

impl<'h> MockDelay<'h> {
    pub fn new() -> Self {
        Self {
            total_ns: 0,
            ticks: 0,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: impl FnMut(u32) + 'h) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Total milliseconds that were "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    /// Number of delay calls
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl embedded_hal::delay::DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        self.ticks += 1;
        if let Some(hook) = self.hook.as_mut() {
            hook(self.ticks);
        }
    }
}

// =============================================================================
// Tracking Allocator
// =============================================================================

#[derive(Debug, Default)]
struct TrackState {
    heap: HeapAllocator,
    live: BTreeSet<DmaAddr>,
    acquires: usize,
    releases: usize,
    fail_in: Option<usize>,
    refused: Vec<DmaMask>,
    mask: Option<DmaMask>,
}

/// Heap allocator that counts traffic and panics on a double or foreign
/// release. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct TrackingAllocator {
    state: Rc<RefCell<TrackState>>,
}

impl TrackingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more acquisitions succeed, then fail with `OutOfMemory`
    pub fn fail_after(&self, n: usize) {
        self.state.borrow_mut().fail_in = Some(n);
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        self.state.borrow_mut().fail_in = None;
    }

    /// Refuse `mask` in `set_mask`
    pub fn refuse_mask(&self, mask: DmaMask) {
        self.state.borrow_mut().refused.push(mask);
    }

    /// Mask accepted by the last successful `set_mask`
    pub fn mask(&self) -> Option<DmaMask> {
        self.state.borrow().mask
    }

    /// Buffers handed out and not yet released
    pub fn outstanding(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn acquires(&self) -> usize {
        self.state.borrow().acquires
    }

    pub fn releases(&self) -> usize {
        self.state.borrow().releases
    }
}

impl DmaAllocator for TrackingAllocator {
    fn set_mask(&mut self, mask: DmaMask) -> DmaResult<()> {
        let mut s = self.state.borrow_mut();
        if s.refused.contains(&mask) {
            return Err(DmaError::AddressOutOfRange);
        }
        s.mask = Some(mask);
        Ok(())
    }

    fn acquire(&mut self, size: usize) -> DmaResult<DmaBuffer> {
        let mut s = self.state.borrow_mut();
        if let Some(remaining) = s.fail_in {
            if remaining == 0 {
                return Err(DmaError::OutOfMemory);
            }
            s.fail_in = Some(remaining - 1);
        }
        let buffer = s.heap.acquire(size)?;
        s.live.insert(buffer.device_addr());
        s.acquires += 1;
        Ok(buffer)
    }

    fn release(&mut self, buffer: DmaBuffer) {
        let mut s = self.state.borrow_mut();
        assert!(
            s.live.remove(&buffer.device_addr()),
            "release of a buffer that is not outstanding"
        );
        s.releases += 1;
        s.heap.release(buffer);
    }
}
