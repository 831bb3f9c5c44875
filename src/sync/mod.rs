//! Synchronization and Concurrency Support
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - Waker slot woken by the completion interrupt
//!
//! - **Async Support** (`asynch`): Async/await support for reclaim
//!   - [`AsyncReclaimExt`] - Extension trait adding `reclaim_async`
//!   - [`ReclaimFuture`] - Future returned by `reclaim_async`
//!
//! # Feature Flags
//!
//! - `async`: Enables this module (implies `critical-section`)
//!
//! # Example
//!
//! ```ignore
//! use ph_loopback_dma::sync::AsyncReclaimExt;
//!
//! static SIGNAL: CompletionSignal = CompletionSignal::new();
//!
//! #[interrupt]
//! fn DMA_IRQ() {
//!     SIGNAL.on_interrupt();
//! }
//!
//! async fn echo(dma: &mut LoopbackDma<'_, Mmio, HeapAllocator, Delay>) -> Result<()> {
//!     dma.submit(b"ping")?;
//!     let pong = dma.reclaim_async(64).await?;
//!     Ok(())
//! }
//! ```

mod primitives;

pub use primitives::{AtomicWaker, CriticalSectionCell};

pub mod asynch;

pub use asynch::{AsyncReclaimExt, ReclaimFuture};
