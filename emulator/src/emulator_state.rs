use common::asm::{BrIns, NUM_REGS, Reg};
use common::constants::{MEM_WORDS, PC_START};

use std::fmt;

use log::trace;

// Exactly one of N, Z and P is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondCode(u16);

impl CondCode {
    pub const N: u16 = BrIns::N;
    pub const Z: u16 = BrIns::Z;
    pub const P: u16 = BrIns::P;

    pub const NEG: CondCode = CondCode(Self::N);
    pub const ZRO: CondCode = CondCode(Self::Z);
    pub const POS: CondCode = CondCode(Self::P);

    pub fn from_value(val: u16) -> CondCode {
        if val == 0 {
            Self::ZRO
        } else if val >> 15 != 0 {
            Self::NEG
        } else {
            Self::POS
        }
    }

    pub fn to_raw(self) -> u16 {
        self.0
    }

    // Whether a BR with condition mask `mask` is taken.
    pub fn matches(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    pub fn get_negative(self) -> bool {
        self == Self::NEG
    }

    pub fn get_zero(self) -> bool {
        self == Self::ZRO
    }

    pub fn get_positive(self) -> bool {
        self == Self::POS
    }
}

impl fmt::Display for CondCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = match *self {
            Self::NEG => 'N',
            Self::ZRO => 'Z',
            _ => 'P',
        };
        write!(f, "{c}")
    }
}

// This is separate so a mutable borrow can be passed to the MMIO handlers.
// Accesses here are raw: they never reach a device.
pub struct EmulatorState {
    num_ins: usize,
    mem: Vec<u16>,
    regs: [u16; NUM_REGS],
    pc: u16,
    cond: CondCode,
    running: bool,
}

impl EmulatorState {
    pub fn new() -> Self {
        EmulatorState {
            num_ins: 0usize,
            mem: vec![0; MEM_WORDS],
            regs: [0; NUM_REGS],
            pc: PC_START,
            cond: CondCode::ZRO,
            running: true,
        }
    }

    // Registers and memory are left alone.
    pub fn reset(&mut self) {
        self.num_ins = 0;
        self.pc = PC_START;
        self.cond = CondCode::ZRO;
        self.running = true;
    }

    pub fn inc_ins(&mut self) {
        self.num_ins += 1;
    }

    pub fn num_ins(&self) -> usize {
        self.num_ins
    }

    pub fn mem_read(&self, addr: u16) -> u16 {
        self.mem[addr as usize]
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        trace!("Mem: writing {val:#06x} to {addr:#06x}");
        self.mem[addr as usize] = val;
    }

    pub fn reg_read(&self, reg: Reg) -> u16 {
        self.regs[reg.index()]
    }

    pub fn reg_write(&mut self, reg: Reg, val: u16) {
        trace!("Reg: writing {val:#06x} to {reg}");
        self.regs[reg.index()] = val;
    }

    // Recompute the condition codes from the current contents of `reg`.
    pub fn update_flags(&mut self, reg: Reg) {
        self.cond = CondCode::from_value(self.reg_read(reg));
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn cond(&self) -> CondCode {
        self.cond
    }

    pub fn set_cond(&mut self, cond: CondCode) {
        self.cond = cond;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn halt(&mut self) {
        self.running = false;
    }
}

impl Default for EmulatorState {
    fn default() -> Self {
        Self::new()
    }
}
