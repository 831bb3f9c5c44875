//! Centralized Constants
//!
//! This module provides a single source of truth for the magic numbers and
//! configuration defaults used throughout the loopback DMA driver.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Transfer sizes**: page size and per-descriptor length limits
//! - **Ring geometry**: default and permitted ring depths, alignment
//! - **Timing**: reclaim timeout and wait pacing
//! - **Device control**: reset and interrupt-enable values
//!
//! # Note
//!
//! Register offsets and descriptor bit definitions remain in their respective
//! modules (`register/mod.rs`, `dma/descriptor/bits.rs`) as they describe the
//! hardware layout rather than driver policy.

// =============================================================================
// Transfer Sizes
// =============================================================================

/// Platform memory page size in bytes
pub const PAGE_SIZE: usize = 4096;

/// Default maximum size of a single transfer (one page)
pub const MAX_TRANSFER_SIZE: usize = PAGE_SIZE;

/// Largest length the 16-bit descriptor length fields can carry
pub const MAX_DESCRIPTOR_LEN: usize = 0xFFFF;

// =============================================================================
// Ring Geometry
// =============================================================================

/// Default ring depth requested from the device
pub const DEFAULT_RING_SIZE: u32 = 128;

/// Smallest usable ring (one slot is always kept empty)
pub const MIN_RING_SIZE: u32 = 2;

/// Largest ring depth the driver will request
pub const MAX_RING_SIZE: u32 = 1 << 16;

/// Alignment of every buffer handed out by the heap allocator
pub const DMA_ALIGN: usize = 64;

// =============================================================================
// Timing Constants
// =============================================================================

/// Default bound on a blocked reclaim, in milliseconds
pub const RECLAIM_TIMEOUT_MS: u32 = 5000;

/// Interval between head-register checks while a reclaim is blocked
pub const RECLAIM_POLL_INTERVAL_US: u32 = 100;

// =============================================================================
// Device Control Values
// =============================================================================

/// Value written to the reset register to reset the device
pub const DEVICE_RESET: u32 = 0x8000_0000;

/// Interrupt enable register value: completion interrupts on
pub const INTERRUPTS_ON: u32 = 1;

/// Interrupt enable register value: all interrupts off
pub const INTERRUPTS_OFF: u32 = 0;
