use std::io;
use std::sync::Arc;

use common::constants::{KBDR, KBSR, KBSR_READY};
use log::trace;

use crate::EmulatorState;
use crate::io::MMIOHandler;
use crate::io::console::Console;

// The keyboard status and data registers. Their values live in ordinary
// memory cells; reading KBSR polls the console and refreshes both.
pub struct Keyboard {
    console: Arc<dyn Console>,
}

impl Keyboard {
    const ADDRS: [u16; 2] = [KBSR, KBDR];

    pub fn new(console: Arc<dyn Console>) -> Keyboard {
        Keyboard { console }
    }

    fn poll(&mut self, emu: &mut EmulatorState) -> io::Result<u16> {
        if self.console.key_available()? {
            let ch = self.console.read_char()?;
            trace!("Keyboard: got {ch:#04x}");
            emu.mem_write(KBSR, KBSR_READY);
            emu.mem_write(KBDR, ch);
        } else {
            emu.mem_write(KBSR, 0);
        }
        Ok(emu.mem_read(KBSR))
    }
}

impl MMIOHandler for Keyboard {
    fn reset(&mut self, emu: &mut EmulatorState) {
        emu.mem_write(KBSR, 0);
        emu.mem_write(KBDR, 0);
    }

    fn default_addrs(&self) -> &[u16] {
        &Self::ADDRS
    }

    fn read_word(&mut self, emu: &mut EmulatorState, addr: u16) -> io::Result<u16> {
        match addr {
            KBSR => self.poll(emu),
            _ => Ok(emu.mem_read(addr)),
        }
    }

    fn write_word(&mut self, emu: &mut EmulatorState, addr: u16, val: u16) {
        emu.mem_write(addr, val);
    }
}
