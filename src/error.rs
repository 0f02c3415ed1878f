use std::io;
use std::sync;

/// Everything that can stop the virtual machine.
///
/// Unknown opcodes are deliberately absent: they are logged and skipped by
/// the interpreter rather than surfaced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// reading a ROM (or talking to the terminal) failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("stack overflow: call at {pc:#06X} with all 16 stack slots in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    /// an activity panicked while holding the machine state
    #[error("machine state lock poisoned: {0}")]
    Poisoned(String),

    /// the OS would not give us a thread for an activity
    #[error("could not start the {name} activity: {source}")]
    ActivitySpawn {
        name: &'static str,
        source: io::Error,
    },

    #[error("scheduler activity failed: {0}")]
    Activity(String),
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(err: sync::PoisonError<T>) -> Self {
        Error::Poisoned(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
