
pub mod console;
pub mod keyboard;

use crate::EmulatorState;

// A device that intercepts reads and writes to some addresses in the
// memory-mapped region. Reads may have side effects, hence `&mut self`.
pub trait MMIOHandler: Send {
    fn reset(&mut self, _emu: &mut EmulatorState) {}
    fn default_addrs(&self) -> &[u16] {
        &[]
    }

    fn read_word(&mut self, emu: &mut EmulatorState, addr: u16) -> std::io::Result<u16>;
    fn write_word(&mut self, emu: &mut EmulatorState, addr: u16, val: u16);
}
