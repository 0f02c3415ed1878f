//! # chip8-tui
//!
//! A CHIP-8 virtual machine with a terminal dashboard.
//!
//! ## Design
//!
//! * the interpreter knows nothing about threads, terminals or time; it
//!   executes one instruction per `step()`
//! * the scheduler owns timing: instructions, timers and the keypad are
//!   three periodic activities sharing one lock
//! * the machine tells the outside world about changes through the
//!   `Frontend` trait, and the outside world reads `Snapshot`s
//! * rendering and input are traits too, so the session loop can be driven
//!   by a script in tests
//!
//! Model
//!
//! ```text
//! main
//!  |-- Config (from the command line)
//!  |-- Machine(config, frontend)
//!  |    |-- Chip8Interpreter
//!  |    |    `-- State: memory, registers, stack, timers, keypad, frame
//!  |    `-- activities: cpu, timers, keypad
//!  `-- run_session(machine, updates, input, screen)
//!       |-- input command  -> machine.run / stop / step_once / send_key
//!       |-- frontend update -> screen.render(machine.snapshot())
//!       `-- fault           -> machine.stop, end session
//! ```
pub mod app;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod frontend;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod opcode;
pub mod scheduler;
pub mod snapshot;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use frontend::{ChannelFrontend, Frontend, NullFrontend, Update};
pub use interpreter::Chip8Interpreter;
pub use keypad::KeyEvent;
pub use scheduler::Machine;
pub use snapshot::Snapshot;
