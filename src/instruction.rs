use crate::opcode::Opcode;
use std::fmt;

/// The decoded form of an opcode. Register operands are register numbers
/// (0x0-0xF), not register values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    // 0NNN
    // call a COSMAC VIP machine-code routine; deliberately a no-op here
    MachineCall(u16),
    // 00E0
    ClearScreen,
    // 00EE
    Return,
    // 1NNN
    Jump(u16),
    // 2NNN
    Call(u16),
    // 3XNN
    SkipEqualConstant(u8, u8),
    // 4XNN
    SkipNotEqualConstant(u8, u8),
    // 5XY0
    SkipEqualRegister(u8, u8),
    // 6XNN
    SetRegister(u8, u8),
    // 7XNN
    AddToRegister(u8, u8),
    // 8XY0
    CopyRegister(u8, u8),
    // 8XY1
    Or(u8, u8),
    // 8XY2
    And(u8, u8),
    // 8XY3
    XOr(u8, u8),
    // 8XY4
    Add(u8, u8),
    // 8XY5
    SubtractForward(u8, u8),
    // 8XY6
    RightShift(u8, u8),
    // 8XY7
    SubtractBackward(u8, u8),
    // 8XYE
    LeftShift(u8, u8),
    // 9XY0
    SkipNotEqualRegister(u8, u8),
    // ANNN
    SetIndex(u16),
    // BNNN
    JumpWithOffset(u16),
    // CXNN
    Random(u8, u8),
    // DXYN
    // draw an N pixel tall sprite from memory at I to (VX, VY)
    Draw(u8, u8, u8),
    // EX9E
    SkipIfPressed(u8),
    // EXA1
    SkipIfNotPressed(u8),
    // FX07
    CopyDelayToRegister(u8),
    // FX0A
    WaitForKey(u8),
    // FX15
    CopyRegisterToDelay(u8),
    // FX18
    CopyRegisterToSound(u8),
    // FX1E
    AddToIndex(u8),
    // FX29
    PointAtGlyph(u8),
    // FX33
    StoreDecimal(u8),
    // FX55
    StoreRegisters(u8),
    // FX65
    LoadRegisters(u8),
    Unknown(u16),
}

impl Instruction {
    pub fn decode(op: u16) -> Self {
        use Instruction::*;
        let (x, y, nn, nnn) = (op.x(), op.y(), op.nn(), op.nnn());
        match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Return,
            (0x0, ..) => MachineCall(nnn),
            (0x1, ..) => Jump(nnn),
            (0x2, ..) => Call(nnn),
            (0x3, ..) => SkipEqualConstant(x, nn),
            (0x4, ..) => SkipNotEqualConstant(x, nn),
            (0x5, .., 0x0) => SkipEqualRegister(x, y),
            (0x6, ..) => SetRegister(x, nn),
            (0x7, ..) => AddToRegister(x, nn),
            (0x8, .., 0x0) => CopyRegister(x, y),
            (0x8, .., 0x1) => Or(x, y),
            (0x8, .., 0x2) => And(x, y),
            (0x8, .., 0x3) => XOr(x, y),
            (0x8, .., 0x4) => Add(x, y),
            (0x8, .., 0x5) => SubtractForward(x, y),
            (0x8, .., 0x6) => RightShift(x, y),
            (0x8, .., 0x7) => SubtractBackward(x, y),
            (0x8, .., 0xE) => LeftShift(x, y),
            (0x9, .., 0x0) => SkipNotEqualRegister(x, y),
            (0xA, ..) => SetIndex(nnn),
            (0xB, ..) => JumpWithOffset(nnn),
            (0xC, ..) => Random(x, nn),
            (0xD, .., n) => Draw(x, y, n),
            (0xE, .., 0x9, 0xE) => SkipIfPressed(x),
            (0xE, .., 0xA, 0x1) => SkipIfNotPressed(x),
            (0xF, .., 0x0, 0x7) => CopyDelayToRegister(x),
            (0xF, .., 0x0, 0xA) => WaitForKey(x),
            (0xF, .., 0x1, 0x5) => CopyRegisterToDelay(x),
            (0xF, .., 0x1, 0x8) => CopyRegisterToSound(x),
            (0xF, .., 0x1, 0xE) => AddToIndex(x),
            (0xF, .., 0x2, 0x9) => PointAtGlyph(x),
            (0xF, .., 0x3, 0x3) => StoreDecimal(x),
            (0xF, .., 0x5, 0x5) => StoreRegisters(x),
            (0xF, .., 0x6, 0x5) => LoadRegisters(x),
            _ => Unknown(op),
        }
    }

    /// the opcode pattern, e.g. `8XY4`
    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            MachineCall(_) => "0NNN",
            ClearScreen => "00E0",
            Return => "00EE",
            Jump(_) => "1NNN",
            Call(_) => "2NNN",
            SkipEqualConstant(..) => "3XNN",
            SkipNotEqualConstant(..) => "4XNN",
            SkipEqualRegister(..) => "5XY0",
            SetRegister(..) => "6XNN",
            AddToRegister(..) => "7XNN",
            CopyRegister(..) => "8XY0",
            Or(..) => "8XY1",
            And(..) => "8XY2",
            XOr(..) => "8XY3",
            Add(..) => "8XY4",
            SubtractForward(..) => "8XY5",
            RightShift(..) => "8XY6",
            SubtractBackward(..) => "8XY7",
            LeftShift(..) => "8XYE",
            SkipNotEqualRegister(..) => "9XY0",
            SetIndex(_) => "ANNN",
            JumpWithOffset(_) => "BNNN",
            Random(..) => "CXNN",
            Draw(..) => "DXYN",
            SkipIfPressed(_) => "EX9E",
            SkipIfNotPressed(_) => "EXA1",
            CopyDelayToRegister(_) => "FX07",
            WaitForKey(_) => "FX0A",
            CopyRegisterToDelay(_) => "FX15",
            CopyRegisterToSound(_) => "FX18",
            AddToIndex(_) => "FX1E",
            PointAtGlyph(_) => "FX29",
            StoreDecimal(_) => "FX33",
            StoreRegisters(_) => "FX55",
            LoadRegisters(_) => "FX65",
            Unknown(_) => "????",
        }
    }

    pub fn category(&self) -> Category {
        use Instruction::*;
        match self {
            MachineCall(_) => Category::Call,
            ClearScreen | Draw(..) => Category::Display,
            Return | Jump(_) | Call(_) | JumpWithOffset(_) => Category::Flow,
            SkipEqualConstant(..)
            | SkipNotEqualConstant(..)
            | SkipEqualRegister(..)
            | SkipNotEqualRegister(..) => Category::Cond,
            SetRegister(..) | AddToRegister(..) => Category::Const,
            CopyRegister(..) => Category::Assign,
            Or(..) | And(..) | XOr(..) | RightShift(..) | LeftShift(..) => Category::BitOp,
            Add(..) | SubtractForward(..) | SubtractBackward(..) => Category::Math,
            SetIndex(_) | AddToIndex(_) | PointAtGlyph(_) => Category::Memory,
            StoreRegisters(_) | LoadRegisters(_) => Category::Memory,
            Random(..) => Category::Rand,
            SkipIfPressed(_) | SkipIfNotPressed(_) | WaitForKey(_) => Category::KeyOp,
            CopyDelayToRegister(_) | CopyRegisterToDelay(_) => Category::Timer,
            CopyRegisterToSound(_) => Category::Sound,
            StoreDecimal(_) => Category::Bcd,
            Unknown(_) => Category::Unknown,
        }
    }

    /// what the instruction does, with its operands filled in
    pub fn description(&self) -> String {
        use Instruction::*;
        match *self {
            MachineCall(a) => format!("Calls machine code routine at 0x{:03X}. Not implemented.", a),
            ClearScreen => "Clears the screen.".to_string(),
            Return => "Returns from a subroutine.".to_string(),
            Jump(a) => format!("Jumps to address 0x{:03X}.", a),
            Call(a) => format!("Calls subroutine at 0x{:03X}.", a),
            SkipEqualConstant(x, nn) => format!("Skips the next instruction if V{:X} == 0x{:02X}.", x, nn),
            SkipNotEqualConstant(x, nn) => format!("Skips the next instruction if V{:X} != 0x{:02X}.", x, nn),
            SkipEqualRegister(x, y) => format!("Skips the next instruction if V{:X} == V{:X}.", x, y),
            SetRegister(x, nn) => format!("Sets V{:X} to 0x{:02X}.", x, nn),
            AddToRegister(x, nn) => format!("Adds 0x{:02X} to V{:X} (carry flag is not changed).", nn, x),
            CopyRegister(x, y) => format!("Sets V{:X} to the value of V{:X}.", x, y),
            Or(x, y) => format!("Sets V{:X} to V{:X} | V{:X}.", x, x, y),
            And(x, y) => format!("Sets V{:X} to V{:X} & V{:X}.", x, x, y),
            XOr(x, y) => format!("Sets V{:X} to V{:X} ^ V{:X}.", x, x, y),
            Add(x, y) => format!("Adds V{:X} to V{:X}. VF is set to 1 on carry, 0 otherwise.", y, x),
            SubtractForward(x, y) => format!("Subtracts V{:X} from V{:X}. VF is set to 0 on borrow, 1 otherwise.", y, x),
            RightShift(x, _) => format!("Shifts V{:X} right by one. VF is set to the bit shifted out.", x),
            SubtractBackward(x, y) => format!("Sets V{:X} to V{:X} - V{:X}. VF is set to 0 on borrow, 1 otherwise.", x, y, x),
            LeftShift(x, _) => format!("Shifts V{:X} left by one. VF is set to the bit shifted out.", x),
            SkipNotEqualRegister(x, y) => format!("Skips the next instruction if V{:X} != V{:X}.", x, y),
            SetIndex(a) => format!("Sets I to the address 0x{:03X}.", a),
            JumpWithOffset(a) => format!("Jumps to the address 0x{:03X} plus V0.", a),
            Random(x, nn) => format!("Sets V{:X} to a random number & 0x{:02X}.", x, nn),
            Draw(x, y, n) => format!("Draws an 8x{} sprite from I at (V{:X}, V{:X}). VF is set on collision.", n, x, y),
            SkipIfPressed(x) => format!("Skips the next instruction if the key in V{:X} is pressed.", x),
            SkipIfNotPressed(x) => format!("Skips the next instruction if the key in V{:X} isn't pressed.", x),
            CopyDelayToRegister(x) => format!("Sets V{:X} to the value of the delay timer.", x),
            WaitForKey(x) => format!("Waits for a key press and stores it in V{:X}.", x),
            CopyRegisterToDelay(x) => format!("Sets the delay timer to V{:X}.", x),
            CopyRegisterToSound(x) => format!("Sets the sound timer to V{:X}.", x),
            AddToIndex(x) => format!("Adds V{:X} to I (carry flag is not changed).", x),
            PointAtGlyph(x) => format!("Sets I to the font glyph for the digit in V{:X}.", x),
            StoreDecimal(x) => format!("Stores the decimal digits of V{:X} at I, I+1 and I+2.", x),
            StoreRegisters(x) => format!("Stores V0 to V{:X} in memory starting at I.", x),
            LoadRegisters(x) => format!("Fills V0 to V{:X} from memory starting at I.", x),
            Unknown(op) => format!("Unknown opcode 0x{:04X}. Ignored.", op),
        }
    }
}

/// Instruction families, as usually tabulated for CHIP-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Call,
    Display,
    Flow,
    Cond,
    Const,
    Assign,
    BitOp,
    Math,
    Memory,
    Rand,
    KeyOp,
    Timer,
    Sound,
    Bcd,
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Call => "Call",
            Category::Display => "Display",
            Category::Flow => "Flow",
            Category::Cond => "Cond",
            Category::Const => "Const",
            Category::Assign => "Assig",
            Category::BitOp => "BitOp",
            Category::Math => "Math",
            Category::Memory => "MEM",
            Category::Rand => "Rand",
            Category::KeyOp => "KeyOp",
            Category::Timer => "Timer",
            Category::Sound => "Sound",
            Category::Bcd => "BCD",
            Category::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Read-only description of the last executed instruction, for whatever is
/// showing the machine to a human.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// where the instruction was fetched from
    pub pc: u16,
    pub opcode: u16,
    pub mnemonic: &'static str,
    pub category: Category,
    pub description: String,
}

impl Diagnostic {
    pub fn new(pc: u16, opcode: u16, instruction: &Instruction) -> Self {
        Diagnostic {
            pc,
            opcode,
            mnemonic: instruction.mnemonic(),
            category: instruction.category(),
            description: instruction.description(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PC: {}", self.pc)?;
        writeln!(f, "OPCODE: 0x{:04X}", self.opcode)?;
        writeln!(f, "Name:     {}", self.mnemonic)?;
        writeln!(f, "Type: {}", self.category)?;
        writeln!(f, "Desc: {}", self.description)
    }
}
