
// Extract a `width`-bit field starting at bit `shift`.
pub fn field(word: u16, shift: u32, width: u32) -> u16 {
    debug_assert!(width > 0 && shift + width <= u16::BITS);
    (word >> shift) & (u16::MAX >> (u16::BITS - width))
}

/// Sign extend the low `bits` bits of `val` to a full word.
///
/// Only the sign bit (`bits - 1`) is inspected. When it is set every bit from
/// `bits` through 15 is set, otherwise `val` is returned as is, so callers are
/// expected to have masked the field out already.
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits < u16::BITS);
    if (val >> (bits - 1)) & 0x1 != 0 {
        val | (u16::MAX << bits)
    } else {
        val
    }
}

////////////////////////////////////////////////////////////////////////////////

// A panicking version.
pub trait ToU16P {
    fn to_u16p(self) -> u16;
}

impl ToU16P for usize {
    fn to_u16p(self) -> u16 {
        assert!(self <= u16::MAX as Self);
        self as u16
    }
}

impl ToU16P for u32 {
    fn to_u16p(self) -> u16 {
        assert!(self <= u16::MAX as Self);
        self as u16
    }
}
