use std::io;

use thiserror::Error;

// Anything that stops execution other than HALT.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("illegal opcode {op:#06x} at {pc:#06x}")]
    IllegalOpcode { op: u16, pc: u16 },

    #[error("unknown trap vector {vector:#04x} at {pc:#06x}")]
    UnknownTrap { vector: u8, pc: u16 },

    #[error("console: {0}")]
    Console(io::Error),

    #[error("interrupted")]
    Interrupted,
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::Interrupted => ExecError::Interrupted,
            _ => ExecError::Console(e),
        }
    }
}
