use crossterm::event::{poll, read, Event, KeyCode};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// Something the user asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// press a hex keypad key
    Key(u8),
    Run,
    Stop,
    Step,
    ScrollDown,
    ScrollUp,
    ScrollTop,
    ScrollBottom,
    Quit,
}

/// map of characters typed to the hex key they press, where '1' => 0x01 and
/// 'a' or 'A' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 22] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('A', 0x0a),
    ('B', 0x0b),
    ('C', 0x0c),
    ('D', 0x0d),
    ('E', 0x0e),
    ('F', 0x0f),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// emulator and dashboard controls, with their usage text
pub const CONTROLS: [(char, Command, &str); 8] = [
    ('r', Command::Run, "run program"),
    ('R', Command::Stop, "stop program"),
    ('s', Command::Step, "1 cycle"),
    ('j', Command::ScrollDown, "Mem map down"),
    ('k', Command::ScrollUp, "Mem map up"),
    ('g', Command::ScrollTop, "Mem map top"),
    ('G', Command::ScrollBottom, "Mem map bottom"),
    ('q', Command::Quit, "quit"),
];

/// Lookup from terminal key codes to commands.
pub struct Keymap {
    chars: HashMap<char, Command>,
}

impl Keymap {
    pub fn new() -> Self {
        let mut chars: HashMap<char, Command> = CHIP8_LITERAL_KEYMAP
            .iter()
            .map(|(c, k)| (*c, Command::Key(*k)))
            .collect();
        for (c, command, _) in CONTROLS {
            chars.insert(c, command);
        }
        Keymap { chars }
    }

    pub fn command_for(&self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char(c) => self.chars.get(&c).copied(),
            KeyCode::Down => Some(Command::ScrollDown),
            KeyCode::Up => Some(Command::ScrollUp),
            KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// reads commands
pub trait Input {
    /// wait up to `timeout` for the next command
    fn next_command(&mut self, timeout: Duration) -> io::Result<Option<Command>>;
}

/// Input from the terminal, via crossterm. Expects the terminal to already
/// be in raw mode (the dashboard does that).
pub struct TermInput {
    keymap: Keymap,
}

impl TermInput {
    pub fn new() -> Self {
        TermInput {
            keymap: Keymap::new(),
        }
    }
}

impl Default for TermInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Input for TermInput {
    fn next_command(&mut self, timeout: Duration) -> io::Result<Option<Command>> {
        if !poll(timeout)? {
            return Ok(None);
        }
        match read()? {
            Event::Key(evt) => match self.keymap.command_for(evt.code) {
                Some(command) => Ok(Some(command)),
                None => {
                    log::debug!("no command bound to {:?}", evt.code);
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }
}

/// Input replaying a fixed list of commands, then quitting.
pub struct ScriptedInput {
    commands: VecDeque<Command>,
}

impl ScriptedInput {
    pub fn new(commands: &[Command]) -> Self {
        ScriptedInput {
            commands: commands.iter().copied().collect(),
        }
    }
}

impl Input for ScriptedInput {
    fn next_command(&mut self, _timeout: Duration) -> io::Result<Option<Command>> {
        Ok(Some(self.commands.pop_front().unwrap_or(Command::Quit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_keys() {
        let k = Keymap::new();
        assert_eq!(k.command_for(KeyCode::Char('0')), Some(Command::Key(0)));
        assert_eq!(k.command_for(KeyCode::Char('9')), Some(Command::Key(9)));
        assert_eq!(k.command_for(KeyCode::Char('A')), Some(Command::Key(0xA)));
        assert_eq!(k.command_for(KeyCode::Char('f')), Some(Command::Key(0xF)));
    }

    #[test]
    fn test_controls() {
        let k = Keymap::new();
        assert_eq!(k.command_for(KeyCode::Char('r')), Some(Command::Run));
        assert_eq!(k.command_for(KeyCode::Char('R')), Some(Command::Stop));
        assert_eq!(k.command_for(KeyCode::Char('s')), Some(Command::Step));
        assert_eq!(k.command_for(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(k.command_for(KeyCode::Up), Some(Command::ScrollUp));
        assert_eq!(k.command_for(KeyCode::Char('x')), None);
        assert_eq!(k.command_for(KeyCode::Tab), None);
    }

    #[test]
    fn test_controls_do_not_shadow_keys() {
        for (c, _, _) in CONTROLS {
            assert!(CHIP8_LITERAL_KEYMAP.iter().all(|(k, _)| *k != c));
        }
    }

    #[test]
    fn test_scripted_input_quits_when_done() -> io::Result<()> {
        let mut i = ScriptedInput::new(&[Command::Step]);
        assert_eq!(i.next_command(Duration::ZERO)?, Some(Command::Step));
        assert_eq!(i.next_command(Duration::ZERO)?, Some(Command::Quit));
        Ok(())
    }
}
