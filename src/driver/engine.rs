//! Loopback DMA transfer engine.
//!
//! [`LoopbackDma`] owns one attached device: its register file, the
//! descriptor ring, the allocator that backs every transfer, and the delay
//! used to pace a blocked reclaim. The only state it shares with interrupt
//! context is the borrowed [`CompletionSignal`].
//!
//! A submission is copied into a fresh buffer sized to the payload, published
//! as an in-place descriptor, and left for the device. A reclaim waits for the
//! hardware head to move past the software head, checks the slot, copies the
//! (possibly transformed) payload out, and returns the buffer to the
//! allocator.

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use super::config::{EngineConfig, State};
use super::error::{ConfigError, ConfigResult, DmaError, IoError, Result};
use super::interrupt::CompletionSignal;
use crate::hal::buffer::{DmaAllocator, DmaMask};
use crate::hal::register::RegisterBus;
use crate::internal::dma::{DescriptorRing, DescriptorTable};
use crate::internal::register::device::DeviceRegs;

/// Driver instance for one loopback DMA device.
///
/// # Type Parameters
/// * `B` - Register bus of the device (an [`Mmio`](crate::Mmio) window on hardware)
/// * `A` - Source of device-visible memory
/// * `D` - Delay provider pacing blocked reclaims
///
/// # Example
///
/// ```ignore
/// static SIGNAL: CompletionSignal = CompletionSignal::new();
///
/// let bus = unsafe { Mmio::new(BAR0 as *mut u8) };
/// let mut dma = LoopbackDma::attach(bus, HeapAllocator::new(), delay, &SIGNAL, EngineConfig::new())?;
///
/// dma.submit(b"hello")?;
/// let out = dma.reclaim(64)?;
/// ```
pub struct LoopbackDma<'s, B: RegisterBus, A: DmaAllocator, D: DelayNs> {
    /// Device register file
    regs: DeviceRegs<B>,
    /// Backing memory for the table and every transfer
    allocator: A,
    /// Paces blocked reclaims
    delay: D,
    /// Shared with the interrupt handler
    signal: &'s CompletionSignal,
    /// Configuration in effect
    config: EngineConfig,
    /// Mask accepted during attach
    mask: DmaMask,
    /// Present while running; taken at shutdown
    ring: Option<DescriptorRing>,
}

impl<'s, B: RegisterBus, A: DmaAllocator, D: DelayNs> LoopbackDma<'s, B, A, D> {
    /// Bring up the device and take ownership of it.
    ///
    /// This performs the full bring-up sequence:
    /// 1. Validate `config`
    /// 2. Reset the device
    /// 3. Negotiate DMA addressing, falling back to narrower masks
    /// 4. Program the ring depth and verify it reads back
    /// 5. Allocate and clear the descriptor table
    /// 6. Publish the table address (high half first) and zero the tail
    /// 7. Enable completion interrupts
    ///
    /// Anything acquired before a failing step is released.
    pub fn attach(
        bus: B,
        mut allocator: A,
        delay: D,
        signal: &'s CompletionSignal,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let regs = DeviceRegs::new(bus);
        regs.reset_device();
        debug!("device reset");

        let mask = negotiate_mask(&mut allocator, config.dma_mask)?;
        debug!("DMA mask: {} bits", mask.bits());

        regs.set_ring_size(config.ring_size);
        let readback = regs.ring_size();
        if readback != config.ring_size {
            error!(
                "ring size register mismatch: wrote {}, read {}",
                config.ring_size,
                readback
            );
            return Err(ConfigError::RingSizeMismatch.into());
        }

        let buffer = allocator
            .acquire(DescriptorTable::bytes_for(config.ring_size))
            .inspect_err(|e| error!("descriptor table allocation failed: {}", e))?;
        let table = match DescriptorTable::new(buffer, config.ring_size) {
            Ok(table) => table,
            Err((e, buffer)) => {
                allocator.release(buffer);
                error!("descriptor table unusable: {}", e);
                return Err(e.into());
            }
        };
        let ring = DescriptorRing::new(table);

        regs.set_ring_base(ring.base_addr());
        regs.set_queue_tail(0);
        regs.enable_interrupts();

        info!(
            "loopback DMA attached: {} descriptors at {:#x}",
            ring.len(),
            ring.base_addr()
        );

        Ok(Self {
            regs,
            allocator,
            delay,
            signal,
            config,
            mask,
            ring: Some(ring),
        })
    }

    // =========================================================================
    // Submit
    // =========================================================================

    /// Hand `data` to the device as one in-place transfer.
    ///
    /// Returns the number of bytes accepted: all of `data`, or 0 for an empty
    /// slice (nothing is queued). Never blocks. On error the ring and the
    /// device are left exactly as they were.
    pub fn submit(&mut self, data: &[u8]) -> Result<usize> {
        let Some(ring) = self.ring.as_mut() else {
            return Err(IoError::InvalidState.into());
        };
        if data.is_empty() {
            return Ok(0);
        }
        if data.len() > self.config.max_transfer {
            warn!(
                "submit of {} bytes exceeds max {}",
                data.len(),
                self.config.max_transfer
            );
            return Err(DmaError::TransferTooLarge.into());
        }
        if ring.is_full(self.regs.queue_head()) {
            warn!("descriptor ring full");
            return Err(DmaError::RingFull.into());
        }

        let mut buffer = self
            .allocator
            .acquire(data.len())
            .inspect_err(|e| warn!("buffer allocation failed: {}", e))?;
        if buffer.len() != data.len() {
            self.allocator.release(buffer);
            return Err(DmaError::InvalidLength.into());
        }
        buffer.as_mut_slice().copy_from_slice(data);
        let addr = buffer.device_addr();

        match ring.publish(buffer, &self.regs) {
            Ok(slot) => {
                debug!(
                    "submitted slot {}: addr={:#x} len={}",
                    slot,
                    addr,
                    data.len()
                );
                Ok(data.len())
            }
            Err((e, buffer)) => {
                self.allocator.release(buffer);
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Reclaim
    // =========================================================================

    /// Take the oldest completed transfer, returning at most `max_len` bytes.
    ///
    /// Blocks up to the configured timeout if nothing has completed yet.
    /// Bytes beyond `max_len` are discarded with the slot.
    pub fn reclaim(&mut self, max_len: usize) -> Result<Vec<u8>> {
        self.wait_for_completion()?;
        self.take_completed(|payload| payload[..payload.len().min(max_len)].to_vec())
    }

    /// Like [`Self::reclaim`], copying into `dst`. Returns the bytes copied.
    pub fn reclaim_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.wait_for_completion()?;
        self.take_completed(|payload| {
            let n = payload.len().min(dst.len());
            dst[..n].copy_from_slice(&payload[..n]);
            n
        })
    }

    /// Block until the hardware head has moved past the software head.
    fn wait_for_completion(&mut self) -> Result<()> {
        let Some(ring) = self.ring.as_ref() else {
            return Err(IoError::InvalidState.into());
        };
        if self.signal.take_cancel() {
            debug!("discarding cancel request made before reclaim");
        }
        let head = ring.head();
        if ring.has_completed(self.regs.queue_head()) {
            return Ok(());
        }

        let regs = &self.regs;
        self.signal
            .wait_until(
                &mut self.delay,
                self.config.reclaim_timeout_ms,
                self.config.poll_interval_us,
                || regs.queue_head() != head,
            )
            .inspect_err(|e| match e {
                IoError::Cancelled => info!("reclaim cancelled"),
                _ => warn!("reclaim: {}", e),
            })?;
        Ok(())
    }

    /// Retire the head slot, handing its payload to `f` before the buffer
    /// goes back to the allocator.
    ///
    /// The caller has established that the hardware head is past the slot.
    /// A slot that fails the consistency check is left in place.
    pub(crate) fn take_completed<R>(&mut self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let Some(ring) = self.ring.as_mut() else {
            return Err(IoError::InvalidState.into());
        };
        let slot = ring.head();

        if let Err(e) = ring.observe() {
            error!(
                "descriptor {} still pending after head advance (done={:#x})",
                slot,
                ring.descriptor(slot).raw_done()
            );
            return Err(e.into());
        }
        let buffer = ring
            .retire()
            .inspect_err(|_| error!("descriptor {} completed with no buffer", slot))?;

        let out = f(buffer.as_slice());
        debug!("reclaimed slot {}: {} bytes", slot, buffer.len());
        self.allocator.release(buffer);
        Ok(out)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Check whether a reclaim would return without waiting.
    pub fn has_completed(&self) -> bool {
        self.ring
            .as_ref()
            .is_some_and(|ring| ring.has_completed(self.regs.queue_head()))
    }

    /// Number of transfers the device has finished that are not yet reclaimed
    pub fn completed(&self) -> u32 {
        self.ring
            .as_ref()
            .map_or(0, |ring| ring.completed(self.regs.queue_head()))
    }

    /// Number of transfers submitted and not yet reclaimed
    pub fn in_flight(&self) -> u32 {
        self.ring.as_ref().map_or(0, DescriptorRing::in_flight)
    }

    /// Check whether the next submit would be refused with `RingFull`.
    pub fn is_full(&self) -> bool {
        self.ring
            .as_ref()
            .is_some_and(|ring| ring.is_full(self.regs.queue_head()))
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        if self.ring.is_some() {
            State::Running
        } else {
            State::ShutDown
        }
    }

    /// Negotiated ring depth
    pub fn ring_size(&self) -> u32 {
        self.config.ring_size
    }

    /// Largest accepted submission in bytes
    pub fn max_transfer(&self) -> usize {
        self.config.max_transfer
    }

    /// DMA addressing mask accepted during attach
    pub fn dma_mask(&self) -> DmaMask {
        self.mask
    }

    /// Configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Completion signal this engine waits on
    pub fn signal(&self) -> &'s CompletionSignal {
        self.signal
    }

    /// Backing allocator
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Underlying register bus
    pub fn bus(&self) -> &B {
        self.regs.bus()
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Stop the device and return every buffer to the allocator.
    ///
    /// Interrupts are disabled first, then each outstanding transfer buffer is
    /// released exactly once, then the descriptor table. In-flight transfers
    /// are abandoned. Calling this again does nothing.
    pub fn shutdown(&mut self) {
        let Some(mut ring) = self.ring.take() else {
            return;
        };
        self.regs.disable_interrupts();

        let buffers = ring.drain();
        let abandoned = buffers.len();
        for buffer in buffers {
            self.allocator.release(buffer);
        }
        self.allocator.release(ring.into_table().into_buffer());

        info!("loopback DMA shut down, {} in-flight buffers released", abandoned);
    }
}

impl<B: RegisterBus, A: DmaAllocator, D: DelayNs> Drop for LoopbackDma<'_, B, A, D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Offer `preferred` to the allocator, then each narrower mask in turn.
fn negotiate_mask<A: DmaAllocator>(allocator: &mut A, preferred: DmaMask) -> ConfigResult<DmaMask> {
    let mut candidate = Some(preferred);
    while let Some(mask) = candidate {
        match allocator.set_mask(mask) {
            Ok(()) => return Ok(mask),
            Err(e) => {
                warn!("{}-bit DMA mask refused: {}", mask.bits(), e);
                candidate = mask.narrower();
            }
        }
    }
    error!("no usable DMA mask");
    Err(ConfigError::UnsupportedAddressWidth)
}

// =============================================================================
// Unit Tests
// =============================================================================
