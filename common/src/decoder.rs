
use super::asm::*;
use super::misc::{field, sign_extend};

fn pc_offset(word: u16, bits: u32) -> u16 {
    sign_extend(field(word, 0, bits), bits)
}

fn decode_alu_operands(word: u16) -> AluIns {
    let src2 = if word & AluIns::IMM_FLAG != 0 {
        AluSrc::Imm(pc_offset(word, AluIns::IMM_BITS))
    } else {
        AluSrc::Reg(Reg::from_field(word, 0))
    };
    AluIns {
        dst: Reg::from_field(word, 9),
        src1: Reg::from_field(word, 6),
        src2,
    }
}

fn decode_pc_rel_operands(word: u16) -> PcRelIns {
    PcRelIns {
        reg: Reg::from_field(word, 9),
        offset: pc_offset(word, PcRelIns::OFFSET_BITS),
    }
}

fn decode_base_operands(word: u16) -> BaseIns {
    BaseIns {
        reg: Reg::from_field(word, 9),
        base: Reg::from_field(word, 6),
        offset: pc_offset(word, BaseIns::OFFSET_BITS),
    }
}

fn decode_br(word: u16) -> Ins {
    Ins::Br(BrIns {
        mask: field(word, 9, 3),
        offset: pc_offset(word, BrIns::OFFSET_BITS),
    })
}

fn decode_add(word: u16) -> Ins {
    Ins::Add(decode_alu_operands(word))
}

fn decode_ld(word: u16) -> Ins {
    Ins::Ld(decode_pc_rel_operands(word))
}

fn decode_st(word: u16) -> Ins {
    Ins::St(decode_pc_rel_operands(word))
}

fn decode_jsr(word: u16) -> Ins {
    let target = if word & JsrIns::LONG_FLAG != 0 {
        JsrTarget::Offset(pc_offset(word, JsrIns::OFFSET_BITS))
    } else {
        JsrTarget::Reg(Reg::from_field(word, 6))
    };
    Ins::Jsr(JsrIns { target })
}

fn decode_and(word: u16) -> Ins {
    Ins::And(decode_alu_operands(word))
}

fn decode_ldr(word: u16) -> Ins {
    Ins::Ldr(decode_base_operands(word))
}

fn decode_str(word: u16) -> Ins {
    Ins::Str(decode_base_operands(word))
}

fn decode_rti(_word: u16) -> Ins {
    Ins::Rti
}

fn decode_not(word: u16) -> Ins {
    Ins::Not(NotIns {
        dst: Reg::from_field(word, 9),
        src: Reg::from_field(word, 6),
    })
}

fn decode_ldi(word: u16) -> Ins {
    Ins::Ldi(decode_pc_rel_operands(word))
}

fn decode_sti(word: u16) -> Ins {
    Ins::Sti(decode_pc_rel_operands(word))
}

fn decode_jmp(word: u16) -> Ins {
    Ins::Jmp(JmpIns { base: Reg::from_field(word, 6) })
}

fn decode_res(_word: u16) -> Ins {
    Ins::Res
}

fn decode_lea(word: u16) -> Ins {
    Ins::Lea(decode_pc_rel_operands(word))
}

fn decode_trap(word: u16) -> Ins {
    Ins::Trap(TrapIns { vector: field(word, 0, 8) as u8 })
}

type Decoder = fn(u16) -> Ins;

// Indexed by opcode.
const DECODERS: [Decoder; 16] = [
    decode_br,   // 0x0
    decode_add,  // 0x1
    decode_ld,   // 0x2
    decode_st,   // 0x3
    decode_jsr,  // 0x4
    decode_and,  // 0x5
    decode_ldr,  // 0x6
    decode_str,  // 0x7
    decode_rti,  // 0x8
    decode_not,  // 0x9
    decode_ldi,  // 0xa
    decode_sti,  // 0xb
    decode_jmp,  // 0xc
    decode_res,  // 0xd
    decode_lea,  // 0xe
    decode_trap, // 0xf
];


// Every word decodes to something; RTI and RES are left for the executor to reject.
pub fn decode(word: u16) -> Ins {
    DECODERS[Opcode::of(word) as usize](word)
}
