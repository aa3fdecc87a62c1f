
pub const WORD_SIZE: u16 = 2; // Bytes, as stored in an image file

pub const MEM_WORDS: usize = 0x10000;
pub const MEM_HIGH: u16 = 0xffff;

// Default entry point; user programs are conventionally loaded here.
pub const PC_START: u16 = 0x3000;

pub const MMIO_START: u16 = 0xfe00;

// Keyboard status register. Bit 15 is set while a key is waiting in KBDR.
pub const KBSR: u16 = 0xfe00;
pub const KBSR_READY: u16 = 0x1 << 15;

// Keyboard data register.
pub const KBDR: u16 = 0xfe02;

