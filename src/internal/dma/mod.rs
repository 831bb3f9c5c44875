//! Descriptor ring machinery
//!
//! - [`DescriptorTable`]: descriptors laid over a device-visible buffer
//! - [`DescriptorRing`]: head/tail cursors, per-slot buffer ownership, and the
//!   publish/observe barrier sites

pub(crate) mod descriptor;
mod ring;
mod table;

pub(crate) use ring::DescriptorRing;
pub(crate) use table::DescriptorTable;
