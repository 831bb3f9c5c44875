//! Descriptor field bit definitions.
//!
//! These constants describe the packing of the hardware descriptor words.

/// Completion sentinel (`done` word) values
pub mod done {
    /// Descriptor handed to hardware, transfer not yet complete
    pub const PENDING: u32 = 0xFF00;
    /// Hardware finished the transfer
    pub const COMPLETE: u32 = 0;
}

/// Length word packing (`in_len` low half, `out_len` high half)
pub mod lengths {
    /// Input length mask
    pub const IN_LEN_MASK: u32 = 0x0000_FFFF;
    /// Input length shift
    pub const IN_LEN_SHIFT: u32 = 0;
    /// Output length mask
    pub const OUT_LEN_MASK: u32 = 0xFFFF_0000;
    /// Output length shift
    pub const OUT_LEN_SHIFT: u32 = 16;

    /// Pack input and output lengths into one descriptor word
    #[inline(always)]
    #[must_use]
    pub const fn pack(in_len: u16, out_len: u16) -> u32 {
        ((in_len as u32) << IN_LEN_SHIFT) | ((out_len as u32) << OUT_LEN_SHIFT)
    }

    /// Extract the input length
    #[inline(always)]
    #[must_use]
    pub const fn in_len(word: u32) -> u16 {
        ((word & IN_LEN_MASK) >> IN_LEN_SHIFT) as u16
    }

    /// Extract the output length
    #[inline(always)]
    #[must_use]
    pub const fn out_len(word: u32) -> u16 {
        ((word & OUT_LEN_MASK) >> OUT_LEN_SHIFT) as u16
    }
}
