pub mod emulator;
pub mod emulator_state;
pub mod error;
pub mod io;
mod trap;

pub use emulator::{Emulator, ExecRet};
pub use emulator_state::{CondCode, EmulatorState};
pub use error::ExecError;
pub use io::MMIOHandler;
