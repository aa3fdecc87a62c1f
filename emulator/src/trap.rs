use common::asm::{Reg, TrapIns, TrapVector};
use common::constants::MEM_WORDS;

use log::info;

use crate::{Emulator, ExecError, ExecRet};

const IN_PROMPT: &[u8] = b"Enter a character: ";

impl Emulator {
    pub(crate) fn exec_trap_ins(&mut self, ins: &TrapIns) -> Result<ExecRet, ExecError> {
        let pc = self.state.pc();
        self.state.reg_write(Reg::R7, pc);

        let Some(vector) = TrapVector::from_vector(ins.vector) else {
            return Err(ExecError::UnknownTrap { vector: ins.vector, pc: pc.wrapping_sub(1) });
        };

        match vector {
            TrapVector::Getc => {
                let ch = self.console.read_char()?;
                self.set_r0(ch);
            }
            TrapVector::Out => {
                let ch = self.state.reg_read(Reg::R0) as u8;
                self.console.write_char(ch)?;
            }
            TrapVector::Puts => {
                let out = self.collect_string(|cell, out| {
                    out.push(cell as u8);
                    true
                });
                self.console.write_bytes(&out)?;
            }
            TrapVector::In => {
                self.console.write_bytes(IN_PROMPT)?;
                let ch = self.console.read_char_echo()?;
                self.set_r0(ch);
            }
            TrapVector::Putsp => {
                let out = self.collect_string(|cell, out| {
                    let [lo, hi] = cell.to_le_bytes();
                    if lo == 0 {
                        return false;
                    }
                    out.push(lo);
                    if hi != 0 {
                        out.push(hi);
                    }
                    true
                });
                self.console.write_bytes(&out)?;
            }
            TrapVector::Halt => {
                self.console.write_bytes(b"HALT\n")?;
                self.state.halt();
                info!("Halted after {} instructions", self.state.num_ins());
                return Ok(ExecRet::Halt);
            }
        }

        Ok(ExecRet::Ok)
    }

    fn set_r0(&mut self, val: u16) {
        self.state.reg_write(Reg::R0, val);
        self.state.update_flags(Reg::R0);
    }

    // Walk memory from R0 up to a zero cell, or until `take` declines a cell.
    // Reads are raw, so a string running over KBSR never polls the keyboard.
    fn collect_string(&self, mut take: impl FnMut(u16, &mut Vec<u8>) -> bool) -> Vec<u8> {
        let mut out = vec![];
        let mut addr = self.state.reg_read(Reg::R0);
        for _ in 0..MEM_WORDS {
            let cell = self.state.mem_read(addr);
            if cell == 0 || !take(cell, &mut out) {
                break;
            }
            addr = addr.wrapping_add(1);
        }
        out
    }
}
