use std::io::{self, Write};

use bytemuck::cast_slice;

// Image files store words big-endian, whatever the host is.
pub fn as_be_bytes(input: &[u16]) -> Vec<u8> {
    let swapped: Vec<u16> = input.iter().map(|w| w.to_be()).collect();
    cast_slice(&swapped).to_vec()
}

// Caller guarantees an even number of bytes.
pub fn from_be_bytes(input: &[u8]) -> Vec<u16> {
    debug_assert!(input.len() % 2 == 0);
    input
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

////////////////////////////////////////////////////////////////////////////////

pub trait WriteU16 {
    fn write_u16(&mut self, val: u16) -> io::Result<()>;
}

impl<T: Write> WriteU16 for T {
    fn write_u16(&mut self, val: u16) -> io::Result<()> {
        self.write_all(&val.to_be_bytes())
    }
}
