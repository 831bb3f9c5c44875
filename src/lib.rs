//! Loopback DMA Driver Core
//!
//! A `no_std` Rust driver core for a descriptor-ring loopback DMA device: the
//! device takes buffers from a ring of hardware descriptors, transforms them
//! in place, and raises an interrupt when it has advanced its head index.
//!
//! The crate uses `alloc` for per-transfer buffers, the software context
//! array, and the `Vec` returned by [`LoopbackDma::reclaim`].
//!
//! # Architecture
//!
//! The driver is organized into three layers:
//!
//! 1. **Driver Layer** ([`driver`]): [`LoopbackDma`] submit/reclaim, the
//!    [`CompletionSignal`] shared with the interrupt handler, configuration,
//!    and errors
//! 2. **HAL Layer** ([`hal`]): the [`RegisterBus`] and [`DmaAllocator`] seams
//!    a platform plugs into
//! 3. **Internal Layer**: register map, descriptor layout, and the ring's
//!    head/tail protocol
//!
//! ## Ring Protocol
//!
//! - One slot is always left empty: the ring is full when the next tail
//!   equals the hardware head or a completed slot not yet reclaimed
//! - A slot's descriptor is fully written before the tail register exposes it
//! - A slot is read only after its `done` sentinel is seen cleared
//! - The interrupt handler only bumps the completion signal; it never touches
//!   descriptors or buffers
//!
//! # Features
//!
//! - `defmt`: Enable defmt logging and formatting for error and config types
//! - `log`: Route log output through the `log` facade instead
//! - `critical-section`: Pull in `critical-section` for ISR-safe waker storage
//! - `async`: Enable async reclaim and the `sync` module (implies
//!   `critical-section`)
//!
//! # Example
//!
//! ```ignore
//! use ph_loopback_dma::{CompletionSignal, EngineConfig, HeapAllocator, LoopbackDma, Mmio};
//!
//! static SIGNAL: CompletionSignal = CompletionSignal::new();
//!
//! #[interrupt]
//! fn DMA_IRQ() {
//!     SIGNAL.on_interrupt();
//! }
//!
//! // SAFETY: BAR0 is the device's mapped register window.
//! let bus = unsafe { Mmio::new(BAR0 as *mut u8) };
//! let config = EngineConfig::new().with_ring_size(64);
//! let mut dma = LoopbackDma::attach(bus, HeapAllocator::new(), delay, &SIGNAL, config)?;
//!
//! dma.submit(b"hello")?;
//! let out = dma.reclaim(64)?;
//! dma.shutdown();
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::len_without_is_empty
)]

extern crate alloc;

// Logging shims; must come first so the macros are visible below.
#[macro_use]
mod fmt;

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{EngineConfig, State};
pub use driver::engine::LoopbackDma;
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, ErrorKind, IoError, IoResult, Result,
};
pub use driver::interrupt::CompletionSignal;
pub use hal::buffer::{DmaAddr, DmaAllocator, DmaBuffer, DmaMask, HeapAllocator};
pub use hal::register::{Mmio, RegisterBus};

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer the safe driver APIs instead of touching registers directly.
///
/// # Safety
///
/// Direct register access bypasses driver invariants. Writing the tail or
/// ring registers behind a running [`LoopbackDma`] corrupts its ring state.
pub mod unsafe_registers {
    pub use crate::internal::register::device::{
        DeviceRegs, REG_DEV_RESET, REG_INT_ENABLE, REG_QUEUE_HEAD, REG_QUEUE_TAIL,
        REG_RING_ADDR_HI, REG_RING_ADDR_LO, REG_RING_SIZE,
    };
}

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{AsyncReclaimExt, ReclaimFuture};

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // Registers
        DEVICE_RESET,
        // Ring geometry
        DEFAULT_RING_SIZE,
        DMA_ALIGN,
        MAX_RING_SIZE,
        MIN_RING_SIZE,
        // Transfer sizes
        MAX_DESCRIPTOR_LEN,
        MAX_TRANSFER_SIZE,
        PAGE_SIZE,
        // Timing
        RECLAIM_POLL_INTERVAL_US,
        RECLAIM_TIMEOUT_MS,
    };
    pub use crate::internal::dma::descriptor::bits::done::{
        COMPLETE as DESCRIPTOR_COMPLETE, PENDING as DESCRIPTOR_PENDING,
    };
}
