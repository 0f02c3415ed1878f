//! # interpreter
//!
//! Fetch, decode and execute, one instruction at a time. The program counter
//! is bumped past the instruction before it executes, so:
//!  - jumps and calls simply overwrite it
//!  - calls push the address of the instruction after the call
//!  - skips add another 2
//!  - FX0A winds it back by 2 to run again until a key is down
use crate::config::Config;
use crate::error::Result;
use crate::instruction::{Diagnostic, Instruction};
use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::snapshot::Snapshot;
use crate::state::State;
use rand::Rng;
use std::io;

/// What a single `step` did, beyond the state changes themselves.
#[derive(Clone, Debug)]
pub struct Executed {
    pub diagnostic: Diagnostic,
    /// the frame buffer changed
    pub redraw: bool,
    /// at least one register was written
    pub registers_changed: bool,
}

pub struct Chip8Interpreter {
    state: State,
    load_store_increments_index: bool,
}

impl Chip8Interpreter {
    pub fn new(config: &Config) -> Self {
        Chip8Interpreter {
            state: State::new(),
            load_store_increments_index: config.load_store_increments_index,
        }
    }

    /// load a chip8 program, resetting the machine
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        let len = self.state.load(reader)?;
        log::info!("loaded {} byte program at 0x200", len);
        Ok(len)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// copy out a view for rendering; clears the register changed flags
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::capture(&mut self.state)
    }

    /// Run exactly one instruction.
    ///
    /// Stack faults come back as errors with the program counter left on
    /// the offending instruction. Unknown opcodes are logged and skipped.
    pub fn step(&mut self) -> Result<Executed> {
        let pc = self.state.pc;
        let opcode = self.state.memory.get_word(pc);
        let instruction = Instruction::decode(opcode);
        log::trace!("{:04X}: {:04X} {}", pc, opcode, instruction.mnemonic());

        // recorded up front so a faulting instruction is the one reported
        let diagnostic = Diagnostic::new(pc, opcode, &instruction);
        self.state.opcode = opcode;
        self.state.diagnostic = Some(diagnostic.clone());
        self.state.pc = pc.wrapping_add(2) & 0x0FFF;
        if let Err(e) = self.execute(instruction, pc) {
            log::error!("halting at 0x{:04X}: {}", pc, e);
            self.state.pc = pc;
            return Err(e);
        }

        Ok(Executed {
            diagnostic,
            redraw: self.state.take_redraw(),
            registers_changed: self.state.take_registers_dirty(),
        })
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.state.pc = self.state.pc.wrapping_add(2) & 0x0FFF;
        }
    }

    fn execute(&mut self, ins: Instruction, pc: u16) -> Result<()> {
        use Instruction::*;
        let s = &mut self.state;
        match ins {
            MachineCall(_) => {}
            ClearScreen => {
                s.frame.clear();
                s.request_redraw();
            }
            Return => {
                s.pc = s.pop(pc)?;
            }
            Jump(addr) => s.pc = addr,
            Call(addr) => {
                let ret = s.pc;
                s.push(ret, pc)?;
                s.pc = addr;
            }
            SkipEqualConstant(x, nn) => {
                let c = s.v(x) == nn;
                self.skip_if(c);
            }
            SkipNotEqualConstant(x, nn) => {
                let c = s.v(x) != nn;
                self.skip_if(c);
            }
            SkipEqualRegister(x, y) => {
                let c = s.v(x) == s.v(y);
                self.skip_if(c);
            }
            SkipNotEqualRegister(x, y) => {
                let c = s.v(x) != s.v(y);
                self.skip_if(c);
            }
            SetRegister(x, nn) => s.set_v(x, nn),
            AddToRegister(x, nn) => s.set_v(x, s.v(x).wrapping_add(nn)),
            CopyRegister(x, y) => s.set_v(x, s.v(y)),
            Or(x, y) => s.set_v(x, s.v(x) | s.v(y)),
            And(x, y) => s.set_v(x, s.v(x) & s.v(y)),
            XOr(x, y) => s.set_v(x, s.v(x) ^ s.v(y)),
            // the flag is written last so that VF as an operand sees its old
            // value and VF as the destination ends up holding the flag
            Add(x, y) => {
                let (sum, carry) = s.v(x).overflowing_add(s.v(y));
                s.set_v(x, sum);
                s.set_v(0xF, carry as u8);
            }
            SubtractForward(x, y) => {
                let (vx, vy) = (s.v(x), s.v(y));
                s.set_v(x, vx.wrapping_sub(vy));
                s.set_v(0xF, (vx > vy) as u8);
            }
            SubtractBackward(x, y) => {
                let (vx, vy) = (s.v(x), s.v(y));
                s.set_v(x, vy.wrapping_sub(vx));
                s.set_v(0xF, (vy > vx) as u8);
            }
            RightShift(x, _) => {
                let vx = s.v(x);
                s.set_v(x, vx >> 1);
                s.set_v(0xF, vx & 0x01);
            }
            LeftShift(x, _) => {
                let vx = s.v(x);
                s.set_v(x, vx << 1);
                s.set_v(0xF, (vx >> 7) & 0x01);
            }
            SetIndex(addr) => s.i = addr,
            JumpWithOffset(addr) => s.pc = addr.wrapping_add(s.v(0) as u16) & 0x0FFF,
            Random(x, nn) => {
                let r: u8 = rand::thread_rng().gen();
                s.set_v(x, r & nn);
            }
            Draw(x, y, n) => {
                let sprite: Vec<u8> = (0..n as u16)
                    .map(|row| s.memory.get_byte(s.i.wrapping_add(row)))
                    .collect();
                let (vx, vy) = (s.v(x) as usize, s.v(y) as usize);
                let collision = s.frame.draw_sprite(vx, vy, &sprite);
                s.set_v(0xF, collision as u8);
                s.request_redraw();
            }
            SkipIfPressed(x) => {
                let c = s.keypad.is_pressed(s.v(x));
                self.skip_if(c);
            }
            SkipIfNotPressed(x) => {
                let c = !s.keypad.is_pressed(s.v(x));
                self.skip_if(c);
            }
            CopyDelayToRegister(x) => s.set_v(x, s.delay_timer),
            WaitForKey(x) => match s.keypad.first_pressed() {
                Some(key) => s.set_v(x, key),
                // run this instruction again next tick
                None => s.pc = pc,
            },
            CopyRegisterToDelay(x) => s.delay_timer = s.v(x),
            CopyRegisterToSound(x) => s.sound_timer = s.v(x),
            AddToIndex(x) => s.i = s.i.wrapping_add(s.v(x) as u16),
            PointAtGlyph(x) => s.i = Chip8MemoryMap::font_addr(s.v(x)),
            StoreDecimal(x) => {
                let vx = s.v(x);
                s.memory.set_byte(s.i, vx / 100);
                s.memory.set_byte(s.i.wrapping_add(1), vx / 10 % 10);
                s.memory.set_byte(s.i.wrapping_add(2), vx % 10);
            }
            StoreRegisters(x) => {
                for reg in 0..=x {
                    s.memory.set_byte(s.i.wrapping_add(reg as u16), s.v(reg));
                }
                if self.load_store_increments_index {
                    s.i = s.i.wrapping_add(x as u16 + 1);
                }
            }
            LoadRegisters(x) => {
                for reg in 0..=x {
                    let value = s.memory.get_byte(s.i.wrapping_add(reg as u16));
                    s.set_v(reg, value);
                }
                if self.load_store_increments_index {
                    s.i = s.i.wrapping_add(x as u16 + 1);
                }
            }
            Unknown(op) => {
                log::error!("unknown opcode 0x{:04X} at 0x{:04X}, skipping", op, pc);
            }
        }
        Ok(())
    }
}
