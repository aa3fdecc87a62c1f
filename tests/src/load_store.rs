use crate::harness::*;
use common::asm::Reg;
use common::constants::PC_START;
use emu_lib::CondCode;

#[test]
fn ld_pc_relative() {
    let mut prog = assemble(&[
        ld(Reg::R0, 1),
        halt(),
    ]);
    prog.push(0xdead);
    let (emu, _) = run_words(&prog, 2);
    assert_eq!(emu.reg_read(Reg::R0), 0xdead);
    assert_eq!(emu.cond(), CondCode::NEG);
}

#[test]
fn ld_negative_offset() {
    let (mut emu, _) = load(&assemble(&[
        ld(Reg::R3, -2),
        halt(),
    ]));
    emu.get_state_mut().mem_write(PC_START - 1, 42);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R3), 42);
    assert_eq!(emu.cond(), CondCode::POS);
}

#[test]
fn ldi_indirect() {
    let mut prog = assemble(&[
        ldi(Reg::R1, 1),
        halt(),
    ]);
    prog.push(0x4000);
    let (mut emu, _) = load(&prog);
    emu.get_state_mut().mem_write(0x4000, 0);
    emu.reg_write(Reg::R1, 9);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R1), 0);
    assert_eq!(emu.cond(), CondCode::ZRO);
}

#[test]
fn ldr_base_offset() {
    let (mut emu, _) = load(&assemble(&[
        ldr(Reg::R0, Reg::R6, -32),
        ldr(Reg::R1, Reg::R6, 31),
        halt(),
    ]));
    emu.get_state_mut().mem_write(0x5000 - 32, 1);
    emu.get_state_mut().mem_write(0x5000 + 31, 2);
    emu.reg_write(Reg::R6, 0x5000);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 1);
    assert_eq!(emu.reg_read(Reg::R1), 2);
}

#[test]
fn ldr_wraps_around_memory() {
    let (mut emu, _) = load(&assemble(&[
        ldr(Reg::R0, Reg::R1, 2),
        halt(),
    ]));
    emu.get_state_mut().mem_write(0x0001, 0x1234);
    emu.reg_write(Reg::R1, 0xffff);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 0x1234);
}

#[test]
fn lea_sets_flags() {
    let (emu, _) = run(&[
        lea(Reg::R2, -1),
        halt(),
    ]);
    assert_eq!(emu.reg_read(Reg::R2), PC_START);
    assert_eq!(emu.cond(), CondCode::POS);
}

#[test]
fn st_pc_relative() {
    let mut prog = assemble(&[
        add(Reg::R4, Reg::R4, imm(-5)),
        st(Reg::R4, 1),
        halt(),
    ]);
    prog.push(0);
    let (emu, _) = run_words(&prog, 3);
    assert_eq!(emu.get_state().mem_read(PC_START + 3), (-5i16) as u16);
}

#[test]
fn stores_leave_flags() {
    let mut prog = assemble(&[
        add(Reg::R0, Reg::R0, imm(0)),
        st(Reg::R1, 1),
        halt(),
    ]);
    prog.push(0);
    let (mut emu, _) = load(&prog);
    emu.reg_write(Reg::R1, 0x8000);
    emu.run().unwrap();
    assert_eq!(emu.cond(), CondCode::ZRO);
}

#[test]
fn sti_indirect() {
    let mut prog = assemble(&[
        sti(Reg::R2, 1),
        halt(),
    ]);
    prog.push(0x4100);
    let (mut emu, _) = load(&prog);
    emu.reg_write(Reg::R2, 0x7777);
    emu.run().unwrap();
    assert_eq!(emu.get_state().mem_read(0x4100), 0x7777);
    // The pointer itself is untouched.
    assert_eq!(emu.get_state().mem_read(PC_START + 2), 0x4100);
}

#[test]
fn str_base_offset() {
    let (mut emu, _) = load(&assemble(&[
        str(Reg::R7, Reg::R0, 31),
        str(Reg::R7, Reg::R0, -1),
        halt(),
    ]));
    emu.reg_write(Reg::R0, 0x6000);
    emu.reg_write(Reg::R7, 0xabcd);
    emu.run().unwrap();
    assert_eq!(emu.get_state().mem_read(0x601f), 0xabcd);
    assert_eq!(emu.get_state().mem_read(0x5fff), 0xabcd);
}

#[test]
fn flags_follow_every_destination_write() {
    for val in [0u16, 1, 0x7fff, 0x8000, 0xffff] {
        let mut prog = assemble(&[
            ld(Reg::R5, 1),
            halt(),
        ]);
        prog.push(val);
        let (emu, _) = run_words(&prog, 2);
        assert_eq!(emu.cond(), CondCode::from_value(val), "val {val:#06x}");
        assert_eq!(emu.cond().to_raw().count_ones(), 1);
    }
}
