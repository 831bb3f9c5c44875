//! Async/await support for reclaim.
//!
//! The completion interrupt already wakes the waker stored in the engine's
//! [`CompletionSignal`](crate::CompletionSignal), so no separate interrupt
//! handler is needed: keep calling `on_interrupt` from the ISR.
//!
//! Timeouts are the executor's business (wrap the future in its `with_timeout`
//! or equivalent). Dropping a pending [`ReclaimFuture`] leaves the ring as it
//! was.

use alloc::vec::Vec;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embedded_hal::delay::DelayNs;

use crate::driver::config::State;
use crate::driver::engine::LoopbackDma;
use crate::driver::error::{IoError, Result};
use crate::hal::buffer::DmaAllocator;
use crate::hal::register::RegisterBus;

/// Future for an async reclaim.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct ReclaimFuture<'a, 's, B: RegisterBus, A: DmaAllocator, D: DelayNs> {
    dma: &'a mut LoopbackDma<'s, B, A, D>,
    max_len: usize,
}

impl<'a, 's, B: RegisterBus, A: DmaAllocator, D: DelayNs> ReclaimFuture<'a, 's, B, A, D> {
    /// Create a new reclaim future.
    ///
    /// A cancel request made before this point is discarded.
    pub fn new(dma: &'a mut LoopbackDma<'s, B, A, D>, max_len: usize) -> Self {
        if dma.signal().take_cancel() {
            debug!("discarding cancel request made before reclaim");
        }
        Self { dma, max_len }
    }
}

impl<B: RegisterBus, A: DmaAllocator, D: DelayNs> Future for ReclaimFuture<'_, '_, B, A, D> {
    type Output = Result<Vec<u8>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.dma.state() == State::ShutDown {
            return Poll::Ready(Err(IoError::InvalidState.into()));
        }

        if !this.dma.has_completed() {
            let signal = this.dma.signal();
            if signal.take_cancel() {
                return Poll::Ready(Err(IoError::Cancelled.into()));
            }
            signal.register_waker(cx.waker());
            // The interrupt may have landed between the check and registering.
            if !this.dma.has_completed() {
                return Poll::Pending;
            }
        }

        let max_len = this.max_len;
        Poll::Ready(
            this.dma
                .take_completed(|payload| payload[..payload.len().min(max_len)].to_vec()),
        )
    }
}

/// Extension trait providing async reclaim.
pub trait AsyncReclaimExt {
    /// Reclaim the oldest completed transfer once the device reports it,
    /// returning at most `max_len` bytes.
    fn reclaim_async(&mut self, max_len: usize) -> impl Future<Output = Result<Vec<u8>>> + '_;
}

impl<B: RegisterBus, A: DmaAllocator, D: DelayNs> AsyncReclaimExt for LoopbackDma<'_, B, A, D> {
    fn reclaim_async(&mut self, max_len: usize) -> impl Future<Output = Result<Vec<u8>>> + '_ {
        ReclaimFuture::new(self, max_len)
    }
}
