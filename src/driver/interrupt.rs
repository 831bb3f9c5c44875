//! Completion signalling between the device interrupt and a blocked reclaim.
//!
//! The interrupt handler's only job is [`CompletionSignal::on_interrupt`]: one
//! atomic increment (plus a waker kick under the `async` feature). It never
//! touches descriptors, indices, or buffers. All ring state stays with the
//! thread that calls submit and reclaim.
//!
//! The signal is level-style. One interrupt may stand for any number of
//! completed descriptors, and an interrupt may arrive before the head register
//! reflects it. Waiters therefore re-check the head predicate after every
//! wake and derive progress from indices, never from a count of wake-ups.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

use crate::driver::error::{IoError, IoResult};

#[cfg(feature = "async")]
use crate::sync::AtomicWaker;

/// Wake-up primitive shared by the interrupt handler and the reclaim path.
///
/// Place it in a `static` (or anything that outlives the engine) and hand a
/// reference to [`LoopbackDma::attach`](crate::LoopbackDma::attach).
///
/// # Example
///
/// ```ignore
/// static SIGNAL: CompletionSignal = CompletionSignal::new();
///
/// #[interrupt]
/// fn DMA_IRQ() {
///     SIGNAL.on_interrupt();
/// }
/// ```
pub struct CompletionSignal {
    /// Bumped once per interrupt; wraps freely
    generation: AtomicU32,
    /// Pending cancellation request
    cancel: AtomicBool,
    #[cfg(feature = "async")]
    waker: AtomicWaker,
}

impl CompletionSignal {
    /// Create a new signal (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            generation: AtomicU32::new(0),
            cancel: AtomicBool::new(false),
            #[cfg(feature = "async")]
            waker: AtomicWaker::new(),
        }
    }

    /// Interrupt entry point: note that the device made progress.
    ///
    /// Fire-and-forget; safe to call from interrupt context.
    #[inline]
    pub fn on_interrupt(&self) {
        self.generation.fetch_add(1, Ordering::Release);
        #[cfg(feature = "async")]
        self.waker.wake();
    }

    /// Ask a blocked reclaim to give up.
    ///
    /// The request is consumed by the first wait that observes it. A request
    /// made while no reclaim is waiting is discarded when the next reclaim
    /// starts.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        #[cfg(feature = "async")]
        self.waker.wake();
    }

    /// Check whether a cancellation request is pending
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Number of interrupts seen, modulo 2^32
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Consume a pending cancellation request.
    pub(crate) fn take_cancel(&self) -> bool {
        self.cancel.swap(false, Ordering::AcqRel)
    }

    #[cfg(feature = "async")]
    pub(crate) fn register_waker(&self, waker: &core::task::Waker) {
        self.waker.register(waker);
    }

    /// Block until `progressed` holds, the timeout elapses, or the wait is
    /// cancelled.
    ///
    /// `progressed` is evaluated on entry, after every interrupt observed, and
    /// after every poll tick. Between checks the caller is paced by `delay` in
    /// steps of at most `poll_interval_us`.
    pub(crate) fn wait_until<D, F>(
        &self,
        delay: &mut D,
        timeout_ms: u32,
        poll_interval_us: u32,
        mut progressed: F,
    ) -> IoResult<()>
    where
        D: DelayNs,
        F: FnMut() -> bool,
    {
        let budget_us = timeout_ms as u64 * 1000;
        let step_us = poll_interval_us.max(1);
        let mut waited_us = 0u64;
        let mut seen = self.generation();

        loop {
            if progressed() {
                return Ok(());
            }
            if self.take_cancel() {
                return Err(IoError::Cancelled);
            }
            if waited_us >= budget_us {
                return Err(IoError::Timeout);
            }

            // An interrupt since the last look: re-check before sleeping.
            // It may still turn out spurious if the head has not moved.
            let now = self.generation();
            if now != seen {
                seen = now;
                continue;
            }

            let step = (budget_us - waited_us).min(step_us as u64) as u32;
            delay.delay_us(step);
            waited_us += step as u64;
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
