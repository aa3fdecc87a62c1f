use crate::harness::*;
use common::asm::{BrIns, Reg};
use common::constants::{KBDR, KBSR, KBSR_READY, PC_START};

// LDI through a pointer at the end of the program, so the read goes through
// the device path.
fn poll_prog(reads: usize) -> Vec<u16> {
    let mut code = vec![];
    for i in 0..reads {
        // ldi r<i>, kbsr_ptr
        code.push(ldi(Reg::ALL[i], (reads - i) as i16));
    }
    code.push(halt());
    let mut prog = assemble(&code);
    prog.push(KBSR);
    prog
}

#[test]
fn no_key_reads_zero_every_time() {
    let (mut emu, console) = load(&poll_prog(3));
    emu.get_state_mut().mem_write(KBSR, KBSR_READY);
    emu.run().unwrap();
    for r in [Reg::R0, Reg::R1, Reg::R2] {
        assert_eq!(emu.reg_read(r), 0, "{r}");
    }
    assert_eq!(console.num_polls(), 3);
    assert_eq!(emu.get_state().mem_read(KBSR), 0);
}

#[test]
fn key_ready() {
    let mut prog = assemble(&[
        ldi(Reg::R0, 2),
        ldi(Reg::R1, 2),
        halt(),
    ]);
    prog.extend_from_slice(&[KBSR, KBDR]);
    let (mut emu, console) = load(&prog);
    console.push_input(b'k');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), KBSR_READY);
    assert_eq!(emu.reg_read(Reg::R1), b'k' as u16);
    assert!(emu.cond().get_positive());
    assert_eq!(console.pending_input(), 0);
}

#[test]
fn kbdr_read_doesnt_poll() {
    let mut prog = assemble(&[
        ldi(Reg::R0, 1),
        halt(),
    ]);
    prog.push(KBDR);
    let (mut emu, console) = load(&prog);
    console.push_input(b'k');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 0);
    assert_eq!(console.num_polls(), 0);
    assert_eq!(console.pending_input(), 1);
}

#[test]
fn busy_wait_for_key() {
    // loop: ldi r0, kbsr_ptr
    //       brzp loop
    //       ldi r0, kbdr_ptr
    //       halt
    let mut prog = assemble(&[
        ldi(Reg::R0, 3),
        br(BrIns::Z | BrIns::P, -2),
        ldi(Reg::R0, 2),
        halt(),
    ]);
    prog.extend_from_slice(&[KBSR, KBDR]);
    let (mut emu, console) = load(&prog);

    // Spin a while with nothing typed.
    for _ in 0..10 {
        emu.run_ins().unwrap();
    }
    assert_eq!(emu.pc(), PC_START);
    assert_eq!(console.num_polls(), 5);

    console.push_input(b'!');
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), b'!' as u16);
    assert_eq!(console.num_polls(), 6);
}

#[test]
fn status_writes_are_stored() {
    let mut prog = assemble(&[
        sti(Reg::R1, 2),
        sti(Reg::R1, 2),
        halt(),
    ]);
    prog.extend_from_slice(&[KBSR, KBDR]);
    let (mut emu, console) = load(&prog);
    emu.reg_write(Reg::R1, 0x1234);
    emu.run().unwrap();
    assert_eq!(emu.get_state().mem_read(KBSR), 0x1234);
    assert_eq!(emu.get_state().mem_read(KBDR), 0x1234);
    assert_eq!(console.num_polls(), 0);
}

#[test]
fn other_device_space_is_plain_memory() {
    let mut prog = assemble(&[
        sti(Reg::R1, 2),
        ldi(Reg::R2, 1),
        halt(),
    ]);
    prog.push(0xfe04);
    let (mut emu, console) = load(&prog);
    emu.reg_write(Reg::R1, 0x55);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R2), 0x55);
    assert_eq!(console.num_polls(), 0);
}
