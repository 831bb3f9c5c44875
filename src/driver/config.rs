//! Configuration types for the loopback DMA driver

use crate::driver::error::{ConfigError, ConfigResult};
use crate::hal::buffer::DmaMask;
use crate::internal::constants::{
    DEFAULT_RING_SIZE, MAX_RING_SIZE, MAX_TRANSFER_SIZE, MIN_RING_SIZE,
    RECLAIM_POLL_INTERVAL_US, RECLAIM_TIMEOUT_MS,
};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Ring allocated, interrupts enabled, submit/reclaim legal
    Running,
    /// Interrupts disabled, ring and buffers released
    ShutDown,
}

/// Engine configuration
///
/// # Example
///
/// ```ignore
/// let config = EngineConfig::new()
///     .with_ring_size(64)
///     .with_reclaim_timeout_ms(1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Ring depth requested from the device
    pub ring_size: u32,
    /// Largest accepted submission in bytes
    pub max_transfer: usize,
    /// Bound on a blocked reclaim, in milliseconds
    pub reclaim_timeout_ms: u32,
    /// Interval between head-register checks while blocked, in microseconds
    pub poll_interval_us: u32,
    /// Widest DMA addressing the device supports
    pub dma_mask: DmaMask,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
            max_transfer: MAX_TRANSFER_SIZE,
            reclaim_timeout_ms: RECLAIM_TIMEOUT_MS,
            poll_interval_us: RECLAIM_POLL_INTERVAL_US,
            dma_mask: DmaMask::Bits64,
        }
    }

    /// Set the ring depth
    #[must_use]
    pub const fn with_ring_size(mut self, ring_size: u32) -> Self {
        self.ring_size = ring_size;
        self
    }

    /// Set the maximum transfer size
    #[must_use]
    pub const fn with_max_transfer(mut self, bytes: usize) -> Self {
        self.max_transfer = bytes;
        self
    }

    /// Set the reclaim timeout
    #[must_use]
    pub const fn with_reclaim_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.reclaim_timeout_ms = timeout_ms;
        self
    }

    /// Set the wait poll interval
    #[must_use]
    pub const fn with_poll_interval_us(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }

    /// Set the device's DMA addressing capability
    #[must_use]
    pub const fn with_dma_mask(mut self, mask: DmaMask) -> Self {
        self.dma_mask = mask;
        self
    }

    /// Check the configuration for values the device or descriptor format
    /// cannot represent.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.ring_size < MIN_RING_SIZE || self.ring_size > MAX_RING_SIZE {
            return Err(ConfigError::InvalidRingSize);
        }
        if self.max_transfer == 0 || self.max_transfer > MAX_TRANSFER_SIZE {
            return Err(ConfigError::InvalidTransferSize);
        }
        if self.reclaim_timeout_ms == 0 || self.poll_interval_us == 0 {
            return Err(ConfigError::InvalidTiming);
        }
        Ok(())
    }
}
