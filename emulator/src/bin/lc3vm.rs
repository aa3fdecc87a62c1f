
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use common::constants::PC_START;
use emu_lib::io::console::StdConsole;
use emu_lib::{Emulator, ExecError};
use objfile::{ObjError, ObjFile};

use clap::Parser;
use log::{error, info};
use thiserror::Error;


/// LC-3 virtual machine
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Images to load, in order. Later images overwrite earlier ones.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Address at which to start executing (0x3000, x3000 or 12288).
    #[arg(long, value_parser = parse_addr)]
    start: Option<u16>,

    /// Start at the first image's origin instead of 0x3000.
    #[arg(long, conflicts_with = "start")]
    origin_entry: bool,

    /// Don't print the banner.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Load { path: PathBuf, source: ObjError },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("console: {0}")]
    Console(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Load { .. } => 1,
            CliError::Exec(ExecError::Interrupted) => 254,
            CliError::Exec(_) | CliError::Console(_) => 3,
        }
    }
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix(['x', 'X'])) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn run(args: Args) -> Result<(), CliError> {
    // Everything is loaded before anything runs.
    let mut objs = Vec::with_capacity(args.images.len());
    for path in args.images {
        match ObjFile::open(&path) {
            Ok(obj) => objs.push(obj),
            Err(source) => return Err(CliError::Load { path, source }),
        }
    }

    let entry = match (args.start, args.origin_entry) {
        (Some(start), _) => start,
        (None, true) => objs.first().map_or(PC_START, |obj| obj.origin),
        (None, false) => PC_START,
    };

    if !args.quiet {
        println!("lc3vm v{}", env!("CARGO_PKG_VERSION"));
    }

    let console = Arc::new(StdConsole::new()?);
    let mut emu = Emulator::new(console);
    for obj in objs.iter() {
        emu.load_obj(obj);
    }

    info!("Starting at {entry:#06x}");
    emu.run_at(entry)?;
    info!("Executed {} instructions", emu.num_ins());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    // The console, and with it raw mode, is gone by the time `run` returns.
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            eprintln!("lc3vm: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
