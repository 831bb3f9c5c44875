//! Core driver components for the loopback DMA device.
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`interrupt`] - Completion signal shared with the interrupt handler
//! - [`engine`] - The transfer engine
//!
//! # Example
//!
//! ```ignore
//! use ph_loopback_dma::driver::{EngineConfig, Error, LoopbackDma};
//!
//! let config = EngineConfig::new().with_ring_size(64);
//! ```

// Submodules
pub mod config;
pub mod engine;
pub mod error;
pub mod interrupt;

// Re-exports for convenience
pub use config::{EngineConfig, State};
pub use engine::LoopbackDma;
pub use error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, ErrorKind, IoError, IoResult, Result,
};
pub use interrupt::CompletionSignal;
