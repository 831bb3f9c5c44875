//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: Device register offsets and typed accessors
//! - [`constants`]: Internal constants and magic numbers
//! - [`dma`]: Descriptor layout, descriptor table, and ring cursors
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod register;
