use crate::dashboard::{Screen, Scroll};
use crate::error::{Error, Result};
use crate::frontend::Update;
use crate::input::{Command, Input};
use crate::keypad::KeyEvent;
use crate::scheduler::Machine;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// roughly one frame at 60Hz
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// The interactive loop: commands from `input` drive `machine`, and
/// whenever `updates` says something changed the screen is redrawn.
///
/// Ends on `Command::Quit`, stopping the machine. A fault in the running
/// machine ends the session with that fault.
pub fn run_session(
    machine: &mut Machine,
    updates: &Receiver<Update>,
    input: &mut impl Input,
    screen: &mut impl Screen,
) -> Result<()> {
    let mut dirty = true;
    loop {
        let mut fault = None;
        for update in updates.try_iter() {
            match update {
                Update::Fault(msg) => fault = Some(msg),
                _ => dirty = true,
            }
        }
        if fault.is_some() || machine.has_halted() {
            screen.render(&machine.snapshot()?)?;
            machine.stop()?;
            return Err(Error::Activity(
                fault.unwrap_or_else(|| "machine halted".to_string()),
            ));
        }
        if dirty {
            screen.render(&machine.snapshot()?)?;
            dirty = false;
        }

        let command = match input.next_command(POLL_TIMEOUT)? {
            Some(c) => c,
            None => continue,
        };
        log::debug!("command {:?}", command);
        match command {
            Command::Key(k) => machine.send_key(KeyEvent::Press(k)),
            Command::Run => machine.run()?,
            Command::Stop => {
                machine.stop()?;
                dirty = true;
            }
            Command::Step => {
                machine.step_once()?;
            }
            Command::ScrollDown => scroll(screen, Scroll::Down, &mut dirty),
            Command::ScrollUp => scroll(screen, Scroll::Up, &mut dirty),
            Command::ScrollTop => scroll(screen, Scroll::Top, &mut dirty),
            Command::ScrollBottom => scroll(screen, Scroll::Bottom, &mut dirty),
            Command::Quit => break,
        }
    }
    machine.stop()
}

fn scroll(screen: &mut impl Screen, s: Scroll, dirty: &mut bool) {
    screen.scroll(s);
    *dirty = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dashboard::DummyScreen;
    use crate::frontend::ChannelFrontend;
    use crate::input::ScriptedInput;
    use std::sync::Arc;

    fn session(prog: &[u8]) -> (Machine, Receiver<Update>) {
        let (frontend, rx) = ChannelFrontend::new(64);
        let m = Machine::new(Config::default(), Arc::new(frontend));
        let mut rom: &[u8] = prog;
        m.load_program(&mut rom).unwrap();
        (m, rx)
    }

    #[test]
    fn test_step_and_scroll() {
        let (mut m, rx) = session(&[0x60, 0x05, 0x61, 0x05, 0x80, 0x14]);
        let mut input = ScriptedInput::new(&[Command::Step, Command::Step, Command::ScrollDown]);
        let mut screen = DummyScreen::default();
        run_session(&mut m, &rx, &mut input, &mut screen).unwrap();
        assert_eq!(screen.last_pc, Some(0x204));
        assert_eq!(screen.scrolls, vec![Scroll::Down]);
        assert!(screen.frames >= 3);
        let s = m.snapshot().unwrap();
        assert_eq!(s.registers[0].value, 5);
        assert_eq!(s.registers[1].value, 5);
    }

    #[test]
    fn test_key_reaches_wait_for_key() {
        let (mut m, rx) = session(&[0xF3, 0x0A]);
        let mut input = ScriptedInput::new(&[Command::Key(0xB), Command::Step]);
        let mut screen = DummyScreen::default();
        run_session(&mut m, &rx, &mut input, &mut screen).unwrap();
        let s = m.snapshot().unwrap();
        assert_eq!(s.registers[3].value, 0xB);
        assert_eq!(s.pc, 0x202);
        assert!(s.keys[0xB]);
    }

    #[test]
    fn test_step_fault_ends_session() {
        let (mut m, rx) = session(&[0x00, 0xEE]);
        let mut input = ScriptedInput::new(&[Command::Step, Command::Step]);
        let mut screen = DummyScreen::default();
        match run_session(&mut m, &rx, &mut input, &mut screen) {
            Err(Error::StackUnderflow { pc }) => assert_eq!(pc, 0x200),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_quit_stops_machine() {
        let (mut m, rx) = session(&[0x12, 0x00]);
        let mut input = ScriptedInput::new(&[Command::Run]);
        let mut screen = DummyScreen::default();
        run_session(&mut m, &rx, &mut input, &mut screen).unwrap();
        assert!(!m.is_running());
        assert!(screen.frames >= 1);
    }
}
