//! Read-only view of the machine handed to renderers.

use crate::display::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::instruction::Diagnostic;
use crate::keypad::{key_rows, KEY_COUNT};
use crate::memory::{hex_row_of, hex_rows};
use crate::state::{State, REGISTER_COUNT, STACK_DEPTH};

/// a register's value, and whether it was written since the previous snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Register {
    pub value: u8,
    pub changed: bool,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub diagnostic: Option<Diagnostic>,
    pub opcode: u16,
    pub pc: u16,
    pub index: u16,
    pub registers: [Register; REGISTER_COUNT],
    pub stack: [u16; STACK_DEPTH],
    pub sp: usize,
    pub memory: Vec<u8>,
    /// hex dump row holding the program counter
    pub pc_row: usize,
    pub frame: FrameBuffer,
    pub width: usize,
    pub height: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub sound_active: bool,
    pub keys: [bool; KEY_COUNT],
}

impl Snapshot {
    /// Copy out everything a renderer needs. Takes the state mutably
    /// because reading the register changed flags clears them.
    pub fn capture(state: &mut State) -> Self {
        let values = state.registers();
        let changed = state.take_changed();
        let mut registers = [Register::default(); REGISTER_COUNT];
        for (n, r) in registers.iter_mut().enumerate() {
            *r = Register {
                value: values[n],
                changed: changed[n],
            };
        }
        Snapshot {
            diagnostic: state.diagnostic().cloned(),
            opcode: state.opcode(),
            pc: state.pc(),
            index: state.i(),
            registers,
            stack: state.stack(),
            sp: state.sp(),
            memory: state.memory().to_vec(),
            pc_row: hex_row_of(state.pc()),
            frame: state.frame().clone(),
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            delay_timer: state.delay_timer(),
            sound_timer: state.sound_timer(),
            sound_active: state.sound_active(),
            keys: state.keypad().keys(),
        }
    }

    /// `V0:   5`, or `V0: | 5 |` when the register just changed
    pub fn register_rows(&self) -> Vec<String> {
        self.registers
            .iter()
            .enumerate()
            .map(|(n, r)| {
                if r.changed {
                    format!("V{:X}: | {:X} |", n, r.value)
                } else {
                    format!("V{:X}:   {:X}", n, r.value)
                }
            })
            .collect()
    }

    pub fn stack_rows(&self) -> Vec<String> {
        let mut rows: Vec<String> = self
            .stack
            .iter()
            .enumerate()
            .map(|(n, addr)| format!("{:X}: 0x{:04X}", n, addr))
            .collect();
        rows.push(format!("SP: {:X}", self.sp));
        rows
    }

    pub fn memory_rows(&self) -> Vec<String> {
        hex_rows(&self.memory)
    }

    pub fn key_rows(&self) -> Vec<String> {
        key_rows(&self.keys)
    }

    /// the program stats panel
    pub fn info_rows(&self) -> Vec<String> {
        let mut rows = vec![format!("OPCODE: 0x{:04X}", self.opcode)];
        if let Some(d) = &self.diagnostic {
            rows.push(format!("Name:     {}", d.mnemonic));
            rows.push(format!("Type: {}", d.category));
            rows.push(format!("Desc: {}", d.description));
        }
        rows.push(format!("PC: {}", self.pc));
        rows.push(format!("Index: {}", self.index));
        rows.push(format!(
            "Delay: {}  Sound: {}",
            self.delay_timer, self.sound_timer
        ));
        rows.push(format!("Sound: {}", self.sound_active));
        rows
    }
}
