use std::collections::VecDeque;
use std::io::{self, IsTerminal, Read, Write, stdin, stdout};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{self as cbc, Receiver, TryRecvError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::{debug, error};

/// Character I/O used by the keyboard registers and the trap routines.
///
/// Characters are read as raw codes; only the low byte of anything written is
/// meaningful.
pub trait Console: Send + Sync {
    /// Whether a character can be read without blocking. Never consumes it.
    fn key_available(&self) -> io::Result<bool>;

    /// Blocks until a character is available. Does not echo.
    fn read_char(&self) -> io::Result<u16>;

    /// Writes and flushes.
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()>;

    /// Called between instructions. Fails with `Interrupted` once the user
    /// has asked to stop; must not block.
    fn check_interrupt(&self) -> io::Result<()> {
        Ok(())
    }

    fn read_char_echo(&self) -> io::Result<u16> {
        let ch = self.read_char()?;
        self.write_char(ch as u8)?;
        Ok(ch)
    }

    fn write_char(&self, ch: u8) -> io::Result<()> {
        self.write_bytes(&[ch])
    }
}

fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "ctrl-c")
}

////////////////////////////////////////////////////////////////////////////////

const STDIN_BUFFER: usize = 4096;

enum Input {
    // Terminal in raw mode; keys come off crossterm's event queue.
    Raw,
    // Anything else, read by a background thread so polling never blocks.
    // Disconnects at end of input.
    Piped(Receiver<u8>),
}

// The process's terminal. When stdin is a terminal it is put in raw mode for
// as long as this lives, so keys arrive one at a time and unechoed.
pub struct StdConsole {
    input: Input,
    // Keys already taken off the event queue or the reader, not yet read.
    pending: Mutex<VecDeque<u16>>,
}

impl StdConsole {
    pub fn new() -> io::Result<Self> {
        if !stdin().is_terminal() {
            return Self::piped(stdin());
        }
        terminal::enable_raw_mode()?;
        debug!("Console: raw mode enabled");
        Ok(StdConsole { input: Input::Raw, pending: Mutex::new(VecDeque::new()) })
    }

    // Reads `input` a byte at a time on its own thread.
    fn piped(mut input: impl Read + Send + 'static) -> io::Result<Self> {
        let (tx, rx) = cbc::bounded(STDIN_BUFFER);
        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                let mut byte = [0u8];
                loop {
                    match input.read(&mut byte) {
                        Ok(0) => break,
                        Ok(_) => {
                            if tx.send(byte[0]).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            error!("Console: input read failed: {e}");
                            break;
                        }
                    }
                }
                debug!("Console: end of input");
            })?;
        Ok(StdConsole { input: Input::Piped(rx), pending: Mutex::new(VecDeque::new()) })
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<u16>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Map a terminal event to a character code, skipping anything that isn't
    // a key press. Ctrl+C surfaces as `Interrupted`.
    fn key_code(event: Event) -> io::Result<Option<u16>> {
        let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event else {
            return Ok(None);
        };
        if kind == KeyEventKind::Release {
            return Ok(None);
        }

        let ch = match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(interrupted());
            }
            KeyCode::Enter => b'\n',
            KeyCode::Tab => b'\t',
            KeyCode::Backspace => 0x08,
            KeyCode::Esc => 0x1b,
            KeyCode::Char(ch)
                if ch.is_ascii() && !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                ch as u8
            }
            _ => return Ok(None),
        };
        Ok(Some(ch as u16))
    }

    fn queue_event(pending: &mut VecDeque<u16>, event: Event) -> io::Result<()> {
        if let Some(ch) = Self::key_code(event)? {
            pending.push_back(ch);
        }
        Ok(())
    }

    // Move everything that has already arrived into `pending`, without
    // blocking.
    fn drain(&self, pending: &mut VecDeque<u16>) -> io::Result<()> {
        match &self.input {
            Input::Raw => {
                while event::poll(Duration::ZERO)? {
                    Self::queue_event(pending, event::read()?)?;
                }
            }
            Input::Piped(rx) => loop {
                match rx.try_recv() {
                    Ok(byte) => pending.push_back(byte as u16),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            },
        }
        Ok(())
    }
}

impl Console for StdConsole {
    fn key_available(&self) -> io::Result<bool> {
        let mut pending = self.pending();
        if pending.is_empty() {
            self.drain(&mut pending)?;
        }
        Ok(!pending.is_empty())
    }

    fn read_char(&self) -> io::Result<u16> {
        if let Some(ch) = self.pending().pop_front() {
            return Ok(ch);
        }

        match &self.input {
            Input::Raw => loop {
                if let Some(ch) = Self::key_code(event::read()?)? {
                    return Ok(ch);
                }
            },
            Input::Piped(rx) => rx
                .recv()
                .map(u16::from)
                .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "end of input")),
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let mut out = stdout().lock();
        if matches!(self.input, Input::Raw) {
            // Raw mode also turns off output processing.
            for &b in bytes {
                if b == b'\n' {
                    out.write_all(b"\r\n")?;
                } else {
                    out.write_all(&[b])?;
                }
            }
        } else {
            out.write_all(bytes)?;
        }
        out.flush()
    }

    // Raw mode swallows SIGINT, so Ctrl+C has to be picked out of the event
    // queue. Keys seen on the way are kept for later reads.
    fn check_interrupt(&self) -> io::Result<()> {
        if matches!(self.input, Input::Raw) {
            self.drain(&mut self.pending())?;
        }
        Ok(())
    }
}

impl Drop for StdConsole {
    fn drop(&mut self) {
        if matches!(self.input, Input::Raw) {
            if let Err(e) = terminal::disable_raw_mode() {
                error!("Console: failed to restore terminal: {e}");
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

// In-memory console, for tests and for driving the emulator from other code.
#[derive(Default)]
pub struct PipeConsole {
    in_buf: Mutex<VecDeque<u8>>,
    out_buf: Mutex<Vec<u8>>,
    polls: AtomicUsize,
    interrupted: AtomicBool,
}

impl PipeConsole {
    pub fn push_input(&self, val: u8) {
        self.in_buf.lock().unwrap_or_else(PoisonError::into_inner).push_back(val);
    }

    pub fn write_input(&self, vals: &[u8]) {
        for val in vals.iter() {
            self.push_input(*val);
        }
    }

    pub fn pending_input(&self) -> usize {
        self.in_buf.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn take_output_string(&self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }

    // Acts like Ctrl+C: the next `check_interrupt` fails.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Relaxed);
    }

    // How many times `key_available` has been asked.
    pub fn num_polls(&self) -> usize {
        self.polls.load(Ordering::Relaxed)
    }
}

impl Console for PipeConsole {
    fn key_available(&self) -> io::Result<bool> {
        self.polls.fetch_add(1, Ordering::Relaxed);
        Ok(self.pending_input() != 0)
    }

    fn read_char(&self) -> io::Result<u16> {
        let mut input = self.in_buf.lock().unwrap_or_else(PoisonError::into_inner);
        match input.pop_front() {
            Some(ch) => Ok(ch as u16),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "console input exhausted")),
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.out_buf.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(bytes);
        Ok(())
    }

    fn check_interrupt(&self) -> io::Result<()> {
        if self.interrupted.load(Ordering::Relaxed) {
            return Err(interrupted());
        }
        Ok(())
    }
}
