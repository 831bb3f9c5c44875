//! Hardware Abstraction Layer
//!
//! The seams between the driver and the platform it runs on.
//!
//! # Modules
//!
//! - [`register`]: Register bus trait and the volatile MMIO implementation
//! - [`buffer`]: Device-visible buffers and the allocator trait
//!
//! # Delay Integration
//!
//! Blocked reclaims are paced with `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL.

pub mod buffer;
pub mod register;

// Re-export commonly used types
pub use buffer::{DmaAddr, DmaAllocator, DmaBuffer, DmaMask, HeapAllocator};
pub use register::{Mmio, RegisterBus};
