use crate::misc::field;

use std::fmt;

use derive_more::{IsVariant, Unwrap};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

pub const NUM_REGS: usize = 8;

impl Reg {
    pub const NUM_BITS: u32 = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    pub const ALL: [Reg; NUM_REGS] = [
        Reg::R0, Reg::R1, Reg::R2, Reg::R3, Reg::R4, Reg::R5, Reg::R6, Reg::R7,
    ];

    // Every 3-bit field names a register, so this can't fail.
    pub fn from_field(word: u16, shift: u32) -> Reg {
        Self::ALL[field(word, shift, Self::NUM_BITS) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    fn encode_at(self, shift: u32) -> u16 {
        (self as u16) << shift
    }
}


////////////////////////////////////////////////////////////////////////////////


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Br = 0,
    Add,
    Ld,
    St,
    Jsr,
    And,
    Ldr,
    Str,
    Rti,
    Not,
    Ldi,
    Sti,
    Jmp,
    Res,
    Lea,
    Trap,
}

impl Opcode {
    pub const SHIFT: u32 = 12;
    pub const NUM_BITS: u32 = 4;

    const ALL: [Opcode; 16] = [
        Opcode::Br, Opcode::Add, Opcode::Ld, Opcode::St,
        Opcode::Jsr, Opcode::And, Opcode::Ldr, Opcode::Str,
        Opcode::Rti, Opcode::Not, Opcode::Ldi, Opcode::Sti,
        Opcode::Jmp, Opcode::Res, Opcode::Lea, Opcode::Trap,
    ];

    pub fn of(word: u16) -> Opcode {
        Self::ALL[(word >> Self::SHIFT) as usize]
    }

    fn with(self, operands: u16) -> u16 {
        debug_assert_eq!(operands >> Self::SHIFT, 0);
        ((self as u16) << Self::SHIFT) | operands
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}


////////////////////////////////////////////////////////////////////////////////


#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum TrapVector {
    Getc = 0x20,
    Out,
    Puts,
    In,
    Putsp,
    Halt,
}

impl TrapVector {
    pub fn from_vector(vector: u8) -> Option<TrapVector> {
        Self::from_u8(vector)
    }
}

impl fmt::Display for TrapVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}


////////////////////////////////////////////////////////////////////////////////


// Second operand of ADD and AND. Immediates are stored sign extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum AluSrc {
    Reg(Reg),
    Imm(u16),
}

impl fmt::Display for AluSrc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AluSrc::Reg(r) => write!(f, "{r}"),
            AluSrc::Imm(imm) => write!(f, "#{}", *imm as i16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluIns {
    pub dst: Reg,
    pub src1: Reg,
    pub src2: AluSrc,
}

impl AluIns {
    pub const IMM_FLAG: u16 = 0x1 << 5;
    pub const IMM_BITS: u32 = 5;

    fn encode(&self) -> u16 {
        let src2 = match self.src2 {
            AluSrc::Reg(r) => r.encode_at(0),
            AluSrc::Imm(imm) => Self::IMM_FLAG | low_bits(imm, Self::IMM_BITS),
        };
        self.dst.encode_at(9) | self.src1.encode_at(6) | src2
    }
}

impl fmt::Display for AluIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}, {}", self.dst, self.src1, self.src2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotIns {
    pub dst: Reg,
    pub src: Reg,
}

impl NotIns {
    // Bits 5..0 are all ones in a well formed NOT.
    const TRAILER: u16 = 0x3f;

    fn encode(&self) -> u16 {
        self.dst.encode_at(9) | self.src.encode_at(6) | Self::TRAILER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrIns {
    pub mask: u16,
    pub offset: u16,
}

impl BrIns {
    pub const N: u16 = 0b100;
    pub const Z: u16 = 0b010;
    pub const P: u16 = 0b001;
    pub const OFFSET_BITS: u32 = 9;

    fn encode(&self) -> u16 {
        (self.mask & 0x7) << 9 | low_bits(self.offset, Self::OFFSET_BITS)
    }

    fn mnemonic(&self) -> String {
        if self.mask == 0 {
            return "nop".into();
        }
        let mut s = String::from("br");
        for (bit, c) in [(Self::N, 'n'), (Self::Z, 'z'), (Self::P, 'p')] {
            if self.mask & bit != 0 {
                s.push(c);
            }
        }
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JmpIns {
    pub base: Reg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum JsrTarget {
    Reg(Reg),
    Offset(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsrIns {
    pub target: JsrTarget,
}

impl JsrIns {
    pub const LONG_FLAG: u16 = 0x1 << 11;
    pub const OFFSET_BITS: u32 = 11;

    fn encode(&self) -> u16 {
        match self.target {
            JsrTarget::Offset(off) => Self::LONG_FLAG | low_bits(off, Self::OFFSET_BITS),
            JsrTarget::Reg(base) => base.encode_at(6),
        }
    }
}

// LD, LDI, LEA, ST and STI: a register and a PC relative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcRelIns {
    pub reg: Reg,
    pub offset: u16,
}

impl PcRelIns {
    pub const OFFSET_BITS: u32 = 9;

    fn encode(&self) -> u16 {
        self.reg.encode_at(9) | low_bits(self.offset, Self::OFFSET_BITS)
    }
}

// LDR and STR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseIns {
    pub reg: Reg,
    pub base: Reg,
    pub offset: u16,
}

impl BaseIns {
    pub const OFFSET_BITS: u32 = 6;

    fn encode(&self) -> u16 {
        self.reg.encode_at(9) | self.base.encode_at(6) | low_bits(self.offset, Self::OFFSET_BITS)
    }
}

impl fmt::Display for BaseIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}, #{}", self.reg, self.base, self.offset as i16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapIns {
    pub vector: u8,
}

impl TrapIns {
    pub fn new(vector: TrapVector) -> TrapIns {
        TrapIns { vector: vector as u8 }
    }
}

impl fmt::Display for TrapIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match TrapVector::from_vector(self.vector) {
            Some(known) => write!(f, "{known}"),
            None => write!(f, "trap x{:02x}", self.vector),
        }
    }
}


////////////////////////////////////////////////////////////////////////////////


#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum Ins {
    Br(BrIns),
    Add(AluIns),
    Ld(PcRelIns),
    St(PcRelIns),
    Jsr(JsrIns),
    And(AluIns),
    Ldr(BaseIns),
    Str(BaseIns),
    Rti,
    Not(NotIns),
    Ldi(PcRelIns),
    Sti(PcRelIns),
    Jmp(JmpIns),
    Res,
    Lea(PcRelIns),
    Trap(TrapIns),
}

impl Ins {
    pub fn decode(word: u16) -> Ins {
        crate::decoder::decode(word)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Ins::Br(_) => Opcode::Br,
            Ins::Add(_) => Opcode::Add,
            Ins::Ld(_) => Opcode::Ld,
            Ins::St(_) => Opcode::St,
            Ins::Jsr(_) => Opcode::Jsr,
            Ins::And(_) => Opcode::And,
            Ins::Ldr(_) => Opcode::Ldr,
            Ins::Str(_) => Opcode::Str,
            Ins::Rti => Opcode::Rti,
            Ins::Not(_) => Opcode::Not,
            Ins::Ldi(_) => Opcode::Ldi,
            Ins::Sti(_) => Opcode::Sti,
            Ins::Jmp(_) => Opcode::Jmp,
            Ins::Res => Opcode::Res,
            Ins::Lea(_) => Opcode::Lea,
            Ins::Trap(_) => Opcode::Trap,
        }
    }

    pub fn encode(&self) -> u16 {
        let operands = match self {
            Ins::Br(ins) => ins.encode(),
            Ins::Add(ins) | Ins::And(ins) => ins.encode(),
            Ins::Not(ins) => ins.encode(),
            Ins::Jmp(ins) => ins.base.encode_at(6),
            Ins::Jsr(ins) => ins.encode(),
            Ins::Ld(ins) | Ins::Ldi(ins) | Ins::Lea(ins) | Ins::St(ins) | Ins::Sti(ins) => {
                ins.encode()
            }
            Ins::Ldr(ins) | Ins::Str(ins) => ins.encode(),
            Ins::Trap(ins) => ins.vector as u16,
            Ins::Rti | Ins::Res => 0,
        };
        self.opcode().with(operands)
    }

    // `pc` is the already incremented PC, i.e. the address after this instruction.
    pub fn display_with_pc(&self, pc: u16) -> InsWithPc<'_> {
        InsWithPc(self, pc)
    }

    fn fmt_with_pc(&self, f: &mut fmt::Formatter, pc: Option<u16>) -> fmt::Result {
        match self {
            Ins::Add(ins) => write!(f, "add {ins}"),
            Ins::And(ins) => write!(f, "and {ins}"),
            Ins::Not(ins) => write!(f, "not {}, {}", ins.dst, ins.src),
            Ins::Br(ins) if ins.mask == 0 => write!(f, "{}", ins.mnemonic()),
            Ins::Br(ins) => {
                write!(f, "{} ", ins.mnemonic())?;
                fmt_target(f, pc, ins.offset)
            }
            Ins::Jmp(JmpIns { base: Reg::R7 }) => write!(f, "ret"),
            Ins::Jmp(ins) => write!(f, "jmp {}", ins.base),
            Ins::Jsr(JsrIns { target: JsrTarget::Reg(base) }) => write!(f, "jsrr {base}"),
            Ins::Jsr(JsrIns { target: JsrTarget::Offset(off) }) => {
                write!(f, "jsr ")?;
                fmt_target(f, pc, *off)
            }
            Ins::Ld(ins) | Ins::Ldi(ins) | Ins::Lea(ins) | Ins::St(ins) | Ins::Sti(ins) => {
                write!(f, "{} {}, ", self.opcode(), ins.reg)?;
                fmt_target(f, pc, ins.offset)
            }
            Ins::Ldr(ins) | Ins::Str(ins) => write!(f, "{} {ins}", self.opcode()),
            Ins::Trap(ins) => write!(f, "{ins}"),
            Ins::Rti | Ins::Res => write!(f, "{}", self.opcode()),
        }
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_with_pc(f, None)
    }
}

// Just for formatting, like Path::Display()
pub struct InsWithPc<'a>(&'a Ins, u16);

impl fmt::Display for InsWithPc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt_with_pc(f, Some(self.1))
    }
}

fn fmt_target(f: &mut fmt::Formatter, pc: Option<u16>, offset: u16) -> fmt::Result {
    match pc {
        Some(pc) => write!(f, "x{:04x}", pc.wrapping_add(offset)),
        None => write!(f, "#{}", offset as i16),
    }
}

fn low_bits(val: u16, bits: u32) -> u16 {
    val & (u16::MAX >> (u16::BITS - bits))
}
