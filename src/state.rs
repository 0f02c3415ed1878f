use crate::display::FrameBuffer;
use crate::error::{Error, Result};
use crate::instruction::Diagnostic;
use crate::keypad::Keypad;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR};
use std::io;

/// general purpose registers plus VF
pub const REGISTER_COUNT: usize = 16;
/// nested calls allowed
pub const STACK_DEPTH: usize = 16;

/// # State
///
/// Everything the virtual machine knows about.
///
/// Registers
/// - (v) 16 8-bit registers; V0..VE are general purpose, VF is the
///   carry/borrow/collision flag
/// - (i) a 16-bit index register, only the low 12 bits address memory
/// - (pc) program counter, always pointing at the next instruction
/// - (sp) index of the next free stack slot
///
/// Timers
/// - delay and sound, both count down to zero at 60Hz
///
/// Everything else
/// - 16-entry return address stack
/// - 4K memory, with the font at 0x000 and programs at 0x200
/// - 64x32 frame buffer and 16-key keypad
pub struct State {
    pub(crate) memory: Chip8MemoryMap,
    v: [u8; REGISTER_COUNT],
    v_changed: [bool; REGISTER_COUNT],
    registers_dirty: bool,
    pub(crate) i: u16,
    pub(crate) pc: u16,
    stack: [u16; STACK_DEPTH],
    sp: usize,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) keypad: Keypad,
    pub(crate) frame: FrameBuffer,
    redraw: bool,
    pub(crate) opcode: u16,
    pub(crate) diagnostic: Option<Diagnostic>,
}

impl State {
    pub fn new() -> Self {
        State {
            memory: Chip8MemoryMap::new(),
            v: [0; REGISTER_COUNT],
            v_changed: [false; REGISTER_COUNT],
            registers_dirty: false,
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keypad: Keypad::new(),
            frame: FrameBuffer::new(),
            redraw: false,
            opcode: 0,
            diagnostic: None,
        }
    }

    /// Start over with fresh memory (font included) and `rom` at 0x200.
    ///
    /// On failure the previous state is left untouched.
    pub fn load(&mut self, rom: &mut impl io::Read) -> Result<usize> {
        let mut fresh = State::new();
        let len = fresh.memory.load_program(rom)?;
        *self = fresh;
        Ok(len)
    }

    pub fn v(&self, x: u8) -> u8 {
        self.v[(x & 0xf) as usize]
    }

    /// write a register and remember that it changed
    pub(crate) fn set_v(&mut self, x: u8, value: u8) {
        let x = (x & 0xf) as usize;
        self.v[x] = value;
        self.v_changed[x] = true;
        self.registers_dirty = true;
    }

    pub fn registers(&self) -> [u8; REGISTER_COUNT] {
        self.v
    }

    /// per-register changed flags, cleared by the read
    pub(crate) fn take_changed(&mut self) -> [bool; REGISTER_COUNT] {
        std::mem::replace(&mut self.v_changed, [false; REGISTER_COUNT])
    }

    /// whether any register was written since the last call
    pub(crate) fn take_registers_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.registers_dirty, false)
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn stack(&self) -> [u16; STACK_DEPTH] {
        self.stack
    }

    pub(crate) fn push(&mut self, addr: u16, pc: u16) -> Result<()> {
        if self.sp >= STACK_DEPTH {
            return Err(Error::StackOverflow { pc });
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self, pc: u16) -> Result<u16> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow { pc });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// one 60Hz tick: both timers move one step toward zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub(crate) fn request_redraw(&mut self) {
        self.redraw = true;
    }

    pub(crate) fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
