//! Error types for the loopback DMA driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Bring-up and configuration failures
//! - [`DmaError`]: Ring capacity and buffer allocation issues
//! - [`IoError`]: Runtime reclaim failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by the engine's operations. [`Error::kind`] collapses every variant onto
//! the [`ErrorKind`] a caller acts on.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and bring-up errors
///
/// These are fatal for the device instance: the engine is never constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Ring depth outside the supported range
    InvalidRingSize,
    /// Ring size register did not read back the value written
    RingSizeMismatch,
    /// Maximum transfer size is zero or larger than one page
    InvalidTransferSize,
    /// Reclaim timeout or poll interval is zero
    InvalidTiming,
    /// Neither 64-bit nor 32-bit DMA addressing could be established
    UnsupportedAddressWidth,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidRingSize => "invalid ring size",
            ConfigError::RingSizeMismatch => "ring size register mismatch",
            ConfigError::InvalidTransferSize => "invalid maximum transfer size",
            ConfigError::InvalidTiming => "invalid reclaim timing",
            ConfigError::UnsupportedAddressWidth => "no usable DMA address width",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Descriptor ring and buffer errors
///
/// These relate to submitting a transfer: ring capacity, request size, and
/// buffer allocation. None of them leave a descriptor exposed to hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Advancing the tail would collide with the hardware head
    RingFull,
    /// The allocator could not satisfy the request
    OutOfMemory,
    /// Request exceeds the maximum transfer size
    TransferTooLarge,
    /// Zero-sized allocation request
    InvalidLength,
    /// Allocated memory is not reachable under the negotiated DMA mask
    AddressOutOfRange,
    /// Allocated memory is not aligned for descriptors
    Misaligned,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::RingFull => "descriptor ring full",
            DmaError::OutOfMemory => "out of DMA memory",
            DmaError::TransferTooLarge => "transfer exceeds maximum size",
            DmaError::InvalidLength => "invalid buffer length",
            DmaError::AddressOutOfRange => "buffer outside DMA address range",
            DmaError::Misaligned => "buffer misaligned for descriptors",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime reclaim errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// No completion within the reclaim timeout
    Timeout,
    /// The wait was cancelled before a completion arrived
    Cancelled,
    /// Hardware head moved past a descriptor whose sentinel is still pending
    DescriptorNotDone,
    /// Operation not valid in the current state (e.g. after shutdown)
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::Cancelled => "operation cancelled",
            IoError::DescriptorNotDone => "descriptor not done after head advance",
            IoError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// What the caller should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Malformed or oversized request; a caller bug, do not retry
    InvalidArgument,
    /// Ring full; retry after reclaiming
    Busy,
    /// Allocator exhausted; retry later or reduce outstanding transfers
    OutOfMemory,
    /// No completion within the timeout; reclaim may be retried
    DeadlineExceeded,
    /// Wait aborted externally; caller decides whether to retry
    Cancelled,
    /// Hardware/software contract violation; do not retry
    Io,
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Dma(DmaError::RingFull)) => { /* reclaim, then retry */ }
///     Err(Error::Io(IoError::Timeout)) => { /* device slow, retry reclaim */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(ConfigError::UnsupportedAddressWidth | ConfigError::RingSizeMismatch) => {
                ErrorKind::Io
            }
            Error::Config(_) => ErrorKind::InvalidArgument,
            Error::Dma(DmaError::RingFull) => ErrorKind::Busy,
            Error::Dma(DmaError::TransferTooLarge | DmaError::InvalidLength) => {
                ErrorKind::InvalidArgument
            }
            Error::Dma(
                DmaError::OutOfMemory | DmaError::AddressOutOfRange | DmaError::Misaligned,
            ) => ErrorKind::OutOfMemory,
            Error::Io(IoError::Timeout) => ErrorKind::DeadlineExceeded,
            Error::Io(IoError::Cancelled) => ErrorKind::Cancelled,
            Error::Io(IoError::DescriptorNotDone | IoError::InvalidState) => ErrorKind::Io,
        }
    }

    /// Check whether re-issuing the same call later can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Busy | ErrorKind::OutOfMemory | ErrorKind::DeadlineExceeded
        )
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
