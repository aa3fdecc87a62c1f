
use common::asm::*;
use common::constants::*;
use common::decoder::decode;
use objfile::ObjFile;
use crate::io::console::Console;
use crate::io::keyboard::Keyboard;
use crate::{CondCode, EmulatorState, ExecError, MMIOHandler};

use std::collections::HashMap;
use std::ops::BitAnd;
use std::sync::Arc;

use delegate::delegate;
use log::{debug, info, warn};

// Instructions between checks for Ctrl+C.
const INTERRUPT_CHECK_INTERVAL: usize = 1 << 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecRet {
    Ok,
    Halt,
}


pub struct Emulator {
    pub(crate) state: EmulatorState,
    pub(crate) console: Arc<dyn Console>,
    mmio_handlers: Vec<Box<dyn MMIOHandler>>,
    mmio_map: HashMap<u16, usize>,
}

impl Emulator {
    pub fn new(console: Arc<dyn Console>) -> Emulator {
        let mut emu = Emulator {
            state: EmulatorState::new(),
            console: console.clone(),
            mmio_handlers: vec![],
            mmio_map: HashMap::new(),
        };
        emu.set_mmio_handler(Keyboard::new(console));
        emu.reset();
        emu
    }

    // Run until a halt or an error.
    pub fn run(&mut self) -> Result<(), ExecError> {
        while self.state.is_running() {
            self.run_ins()?;
        }
        Ok(())
    }

    pub fn run_at(&mut self, pc: u16) -> Result<(), ExecError> {
        self.state.set_pc(pc);
        self.run()
    }

    // Run a single instruction. An error stops the machine for good.
    pub fn run_ins(&mut self) -> Result<ExecRet, ExecError> {
        let ret = self.check_interrupt().and_then(|()| self.step());
        if ret.is_err() {
            self.state.halt();
        }
        ret
    }

    fn check_interrupt(&self) -> Result<(), ExecError> {
        if self.state.num_ins() % INTERRUPT_CHECK_INTERVAL == 0 {
            self.console.check_interrupt()?;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<ExecRet, ExecError> {
        self.state.inc_ins();

        let addr = self.state.pc();
        let word = self.mem_read(addr)?;
        let pc = addr.wrapping_add(1);
        self.state.set_pc(pc);

        let ins = decode(word);
        debug!("PC: {addr:#06x}: {}", ins.display_with_pc(pc));
        self.exec(&ins, word)
    }

    // Later loads overwrite earlier ones. Nothing here reaches a device.
    pub fn load_image(&mut self, origin: u16, words: &[u16]) {
        let avail = MEM_WORDS - origin as usize;
        if words.len() > avail {
            warn!(
                "Image at {origin:#06x} is {} words, only {avail} fit; truncating",
                words.len()
            );
        }
        for (addr, word) in (origin..=MEM_HIGH).zip(words) {
            self.state.mem_write(addr, *word);
        }
        info!("Loaded {} words at {origin:#06x}", words.len().min(avail));
    }

    pub fn load_obj(&mut self, obj: &ObjFile) {
        self.load_image(obj.origin, &obj.words);
    }

    pub fn set_mmio_handler_for<M, I>(&mut self, handler: M, addrs: I)
    where
        M: MMIOHandler + 'static,
        I: IntoIterator<Item = u16> {

        let idx = self.mmio_handlers.len();
        self.mmio_handlers.push(Box::new(handler));
        for addr in addrs.into_iter() {
            self.register_handler(idx, addr);
        }
    }

    pub fn set_mmio_handler(&mut self, handler: impl MMIOHandler + 'static) {
        let addrs = handler.default_addrs().to_vec();
        self.set_mmio_handler_for(handler, addrs);
    }

    fn register_handler(&mut self, idx: usize, addr: u16) {
        assert!(addr >= MMIO_START, "MMIOHandler addr {addr:#06x} below device space");
        let prev = self.mmio_map.insert(addr, idx);
        assert!(prev.is_none(), "Duplicate MMIOHandler for {addr:#06x}");
    }

    // PC back to the start, flags to Z, devices cleared. Memory and registers
    // are kept.
    pub fn reset(&mut self) {
        self.state.reset();
        for handler in self.mmio_handlers.iter_mut() {
            handler.reset(&mut self.state);
        }
    }


    ///////////////////////////////////////////////////////////////////////////


    pub fn mem_read(&mut self, addr: u16) -> Result<u16, ExecError> {
        if let Some(idx) = self.mmio_map.get(&addr) {
            return Ok(self.mmio_handlers[*idx].read_word(&mut self.state, addr)?);
        }
        Ok(self.state.mem_read(addr))
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        if let Some(idx) = self.mmio_map.get(&addr) {
            self.mmio_handlers[*idx].write_word(&mut self.state, addr, val);
            return;
        }
        self.state.mem_write(addr, val)
    }

    delegate! {
        to self.state {
            pub fn reg_read(&self, reg: Reg) -> u16;
            pub fn reg_write(&mut self, reg: Reg, val: u16);
            pub fn pc(&self) -> u16;
            pub fn cond(&self) -> CondCode;
            pub fn is_running(&self) -> bool;
            pub fn num_ins(&self) -> usize;
        }
    }

    pub fn get_state(&self) -> &EmulatorState {
        &self.state
    }

    pub fn get_state_mut(&mut self) -> &mut EmulatorState {
        &mut self.state
    }

    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    ///////////////////////////////////////////////////////////////////////////
    // Execute
    ///////////////////////////////////////////////////////////////////////////

    fn set_result(&mut self, dst: Reg, val: u16) {
        self.state.reg_write(dst, val);
        self.state.update_flags(dst);
    }

    fn exec_alu_ins(&mut self, ins: &AluIns, op: fn(u16, u16) -> u16) {
        let lhs = self.state.reg_read(ins.src1);
        let rhs = match ins.src2 {
            AluSrc::Reg(r) => self.state.reg_read(r),
            AluSrc::Imm(imm) => imm,
        };
        self.set_result(ins.dst, op(lhs, rhs));
    }

    fn exec_not_ins(&mut self, ins: &NotIns) {
        let val = self.state.reg_read(ins.src);
        self.set_result(ins.dst, !val);
    }

    fn exec_br_ins(&mut self, ins: &BrIns) {
        if self.state.cond().matches(ins.mask) {
            let pc = self.state.pc().wrapping_add(ins.offset);
            self.state.set_pc(pc);
        }
    }

    fn exec_jmp_ins(&mut self, ins: &JmpIns) {
        let new_pc = self.state.reg_read(ins.base);
        self.state.set_pc(new_pc);
    }

    fn exec_jsr_ins(&mut self, ins: &JsrIns) {
        let pc = self.state.pc();
        // Read the base first; JSRR R7 jumps to the old R7.
        let new_pc = match ins.target {
            JsrTarget::Reg(base) => self.state.reg_read(base),
            JsrTarget::Offset(off) => pc.wrapping_add(off),
        };
        self.state.reg_write(Reg::R7, pc);
        self.state.set_pc(new_pc);
    }

    fn pc_rel(&self, offset: u16) -> u16 {
        self.state.pc().wrapping_add(offset)
    }

    fn base_rel(&self, ins: &BaseIns) -> u16 {
        self.state.reg_read(ins.base).wrapping_add(ins.offset)
    }

    fn exec_ld_ins(&mut self, ins: &PcRelIns) -> Result<(), ExecError> {
        let val = self.mem_read(self.pc_rel(ins.offset))?;
        self.set_result(ins.reg, val);
        Ok(())
    }

    fn exec_ldi_ins(&mut self, ins: &PcRelIns) -> Result<(), ExecError> {
        let addr = self.mem_read(self.pc_rel(ins.offset))?;
        let val = self.mem_read(addr)?;
        self.set_result(ins.reg, val);
        Ok(())
    }

    fn exec_ldr_ins(&mut self, ins: &BaseIns) -> Result<(), ExecError> {
        let val = self.mem_read(self.base_rel(ins))?;
        self.set_result(ins.reg, val);
        Ok(())
    }

    fn exec_lea_ins(&mut self, ins: &PcRelIns) {
        let addr = self.pc_rel(ins.offset);
        self.set_result(ins.reg, addr);
    }

    fn exec_st_ins(&mut self, ins: &PcRelIns) {
        let val = self.state.reg_read(ins.reg);
        self.mem_write(self.pc_rel(ins.offset), val);
    }

    fn exec_sti_ins(&mut self, ins: &PcRelIns) -> Result<(), ExecError> {
        let addr = self.mem_read(self.pc_rel(ins.offset))?;
        let val = self.state.reg_read(ins.reg);
        self.mem_write(addr, val);
        Ok(())
    }

    fn exec_str_ins(&mut self, ins: &BaseIns) {
        let val = self.state.reg_read(ins.reg);
        self.mem_write(self.base_rel(ins), val);
    }

    fn exec(&mut self, ins: &Ins, word: u16) -> Result<ExecRet, ExecError> {
        match ins {
            Ins::Add(ins) => self.exec_alu_ins(ins, u16::wrapping_add),
            Ins::And(ins) => self.exec_alu_ins(ins, u16::bitand),
            Ins::Not(ins) => self.exec_not_ins(ins),
            Ins::Br(ins) => self.exec_br_ins(ins),
            Ins::Jmp(ins) => self.exec_jmp_ins(ins),
            Ins::Jsr(ins) => self.exec_jsr_ins(ins),
            Ins::Ld(ins) => self.exec_ld_ins(ins)?,
            Ins::Ldi(ins) => self.exec_ldi_ins(ins)?,
            Ins::Ldr(ins) => self.exec_ldr_ins(ins)?,
            Ins::Lea(ins) => self.exec_lea_ins(ins),
            Ins::St(ins) => self.exec_st_ins(ins),
            Ins::Sti(ins) => self.exec_sti_ins(ins)?,
            Ins::Str(ins) => self.exec_str_ins(ins),
            Ins::Trap(ins) => return self.exec_trap_ins(ins),
            Ins::Rti | Ins::Res => {
                let pc = self.state.pc().wrapping_sub(1);
                return Err(ExecError::IllegalOpcode { op: word, pc });
            }
        }

        Ok(ExecRet::Ok)
    }
}
