//! # scheduler
//!
//! Three periodic activities share one interpreter behind one mutex:
//!
//! ```text
//!  cpu     every clock period   lock -> step()        -> unlock -> notify
//!  timers  every timer period   lock -> tick_timers() -> unlock
//!  keypad  every keypad period  drain key queue -> lock -> apply/expire -> unlock -> notify
//! ```
//!
//! Each activity holds the lock for the whole of its tick, so nothing ever
//! sees a half executed instruction. Key events reach the keypad activity
//! through a channel, so input never waits on the cpu.
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontend::Frontend;
use crate::instruction::Diagnostic;
use crate::interpreter::Chip8Interpreter;
use crate::keypad::KeyEvent;
use crate::snapshot::Snapshot;
use crate::state::State;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Tick = Box<dyn FnMut() -> Result<()> + Send>;

/// The running (or not) virtual machine.
pub struct Machine {
    vm: Arc<Mutex<Chip8Interpreter>>,
    keys_tx: Sender<KeyEvent>,
    keys_rx: Arc<Mutex<Receiver<KeyEvent>>>,
    frontend: Arc<dyn Frontend>,
    config: Config,
    lifecycle: Lifecycle,
}

enum Lifecycle {
    Stopped,
    Running(Activities),
}

struct Activities {
    halt: Arc<AtomicBool>,
    handles: Vec<(&'static str, JoinHandle<Result<()>>)>,
}

impl Activities {
    fn halted(&self) -> bool {
        self.halt.load(Ordering::Acquire)
    }

    /// signal every activity to finish and wait for them; the first error
    /// any of them hit wins
    fn join(self) -> Result<()> {
        self.halt.store(true, Ordering::Release);
        let mut result = Ok(());
        for (name, handle) in self.handles {
            let outcome = handle
                .join()
                .unwrap_or_else(|_| Err(Error::Activity(format!("{} activity panicked", name))));
            match outcome {
                Err(e) if result.is_ok() => result = Err(e),
                Err(e) => log::warn!("{} activity also failed: {}", name, e),
                Ok(()) => {}
            }
        }
        result
    }
}

impl Machine {
    pub fn new(config: Config, frontend: Arc<dyn Frontend>) -> Self {
        let (keys_tx, keys_rx) = channel();
        Machine {
            vm: Arc::new(Mutex::new(Chip8Interpreter::new(&config))),
            keys_tx,
            keys_rx: Arc::new(Mutex::new(keys_rx)),
            frontend,
            config,
            lifecycle: Lifecycle::Stopped,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// load a program, resetting the machine
    pub fn load_program(&self, reader: &mut impl io::Read) -> Result<usize> {
        let len = self.vm.lock()?.load_program(reader)?;
        self.frontend.display_changed();
        self.frontend.registers_changed();
        Ok(len)
    }

    /// running, and no activity has given up
    pub fn is_running(&self) -> bool {
        matches!(&self.lifecycle, Lifecycle::Running(a) if !a.halted())
    }

    /// running, but the activities quit on their own after a fault; call
    /// `stop` to collect the error
    pub fn has_halted(&self) -> bool {
        matches!(&self.lifecycle, Lifecycle::Running(a) if a.halted())
    }

    /// Stopped -> Running. Does nothing if already running.
    ///
    /// A run that halted on a fault is reaped first, and its error returned.
    pub fn run(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        if self.has_halted() {
            self.stop()?;
        }

        let mut activities = Activities {
            halt: Arc::new(AtomicBool::new(false)),
            handles: Vec::with_capacity(3),
        };
        let ticks: [(&'static str, Duration, Tick); 3] = [
            ("cpu", self.config.clock_period(), self.instruction_tick()),
            ("timers", self.config.timer_period(), self.timer_tick()),
            ("keypad", self.config.keypad_period(), self.keypad_tick()),
        ];
        for (name, period, tick) in ticks {
            match spawn_periodic(name, period, Arc::clone(&activities.halt), tick) {
                Ok(handle) => activities.handles.push((name, handle)),
                Err(e) => {
                    if let Err(other) = activities.join() {
                        log::warn!("while abandoning run: {}", other);
                    }
                    return Err(e);
                }
            }
        }
        log::info!(
            "running at {}Hz, timers at {}Hz",
            self.config.clock_hz,
            self.config.timer_hz
        );
        self.lifecycle = Lifecycle::Running(activities);
        Ok(())
    }

    /// Running -> Stopped. When this returns no activity is touching the
    /// machine any more. Returns the fault that halted the run, if any.
    pub fn stop(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Stopped) {
            Lifecycle::Stopped => Ok(()),
            Lifecycle::Running(activities) => {
                log::info!("stopping");
                activities.join()
            }
        }
    }

    /// Execute exactly one instruction now, whatever the scheduler is doing.
    /// Queued key events are applied first.
    pub fn step_once(&self) -> Result<Diagnostic> {
        let events = drain(&self.keys_rx)?;
        let (keys_changed, done) = {
            let mut vm = self.vm.lock()?;
            let keys_changed = refresh_keys(
                vm.state_mut(),
                events,
                self.config.key_auto_clear,
                Instant::now(),
            );
            (keys_changed, vm.step())
        };
        if keys_changed {
            self.frontend.keys_changed();
        }
        let done = done?;
        if done.redraw {
            self.frontend.display_changed();
        }
        self.frontend.registers_changed();
        Ok(done.diagnostic)
    }

    /// queue a key event for the keypad
    pub fn send_key(&self, event: KeyEvent) {
        if self.keys_tx.send(event).is_err() {
            log::warn!("key queue closed, dropped {:?}", event);
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.vm.lock()?.snapshot())
    }

    fn instruction_tick(&self) -> Tick {
        let vm = Arc::clone(&self.vm);
        let frontend = Arc::clone(&self.frontend);
        Box::new(move || {
            let done = vm.lock().map_err(Error::from).and_then(|mut vm| vm.step());
            match done {
                Ok(done) => {
                    if done.redraw {
                        frontend.display_changed();
                    }
                    frontend.registers_changed();
                    Ok(())
                }
                Err(e) => {
                    frontend.faulted(&e);
                    Err(e)
                }
            }
        })
    }

    fn timer_tick(&self) -> Tick {
        let vm = Arc::clone(&self.vm);
        Box::new(move || {
            vm.lock()?.state_mut().tick_timers();
            Ok(())
        })
    }

    fn keypad_tick(&self) -> Tick {
        let vm = Arc::clone(&self.vm);
        let keys_rx = Arc::clone(&self.keys_rx);
        let frontend = Arc::clone(&self.frontend);
        let auto_clear = self.config.key_auto_clear;
        Box::new(move || {
            let events = drain(&keys_rx)?;
            let changed = refresh_keys(
                vm.lock()?.state_mut(),
                events,
                auto_clear,
                Instant::now(),
            );
            if changed {
                frontend.keys_changed();
            }
            Ok(())
        })
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("machine dropped mid-run: {}", e);
        }
    }
}

fn drain(keys_rx: &Mutex<Receiver<KeyEvent>>) -> Result<Vec<KeyEvent>> {
    Ok(keys_rx.lock()?.try_iter().collect())
}

/// apply queued key events, then release everything if the keypad has been
/// quiet for longer than `auto_clear`; true if any key changed
fn refresh_keys(
    state: &mut State,
    events: Vec<KeyEvent>,
    auto_clear: Option<Duration>,
    now: Instant,
) -> bool {
    let mut changed = false;
    for event in events {
        changed |= state.keypad.apply(event, now);
    }
    if let Some(window) = auto_clear {
        if state.keypad.expire(window, now) {
            log::debug!("no key events for {:?}, released all keys", window);
            changed = true;
        }
    }
    changed
}

/// Run `tick` every `period` on its own thread until `halt` is set or the
/// tick fails. A failing tick sets `halt` so its siblings stop too.
fn spawn_periodic(
    name: &'static str,
    period: Duration,
    halt: Arc<AtomicBool>,
    mut tick: Tick,
) -> Result<JoinHandle<Result<()>>> {
    let handle = thread::Builder::new()
        .name(format!("chip8-{}", name))
        .spawn(move || {
            let mut next = Instant::now();
            while !halt.load(Ordering::Acquire) {
                if let Err(e) = tick() {
                    halt.store(true, Ordering::Release);
                    log::debug!("{} activity failed: {}", name, e);
                    return Err(e);
                }
                next += period;
                let now = Instant::now();
                if next > now {
                    spin_sleep::sleep(next - now);
                } else {
                    // running behind; don't try to catch up
                    next = now;
                }
            }
            log::debug!("{} activity stopped", name);
            Ok(())
        })
        .map_err(|source| Error::ActivitySpawn { name, source })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{ChannelFrontend, NullFrontend, Update};

    fn machine(config: Config, prog: &[u8]) -> Machine {
        let m = Machine::new(config, Arc::new(NullFrontend));
        let mut rom: &[u8] = prog;
        m.load_program(&mut rom).unwrap();
        m
    }

    fn fast() -> Config {
        Config {
            clock_hz: 1000,
            timer_hz: 1000,
            keypad_hz: 1000,
            ..Config::default()
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_step_once_while_stopped() -> Result<()> {
        let m = machine(Config::default(), &[0x60, 0x05]);
        let d = m.step_once()?;
        assert_eq!(d.mnemonic, "6XNN");
        assert!(!m.is_running());
        let snap = m.snapshot()?;
        assert_eq!(snap.registers[0].value, 5);
        assert_eq!(snap.pc, 0x202);
        Ok(())
    }

    #[test]
    fn test_step_once_surfaces_fault() {
        let m = machine(Config::default(), &[0x00, 0xEE]);
        assert!(matches!(m.step_once(), Err(Error::StackUnderflow { .. })));
    }

    #[test]
    fn test_queued_key_satisfies_wait_on_step() -> Result<()> {
        let m = machine(Config::default(), &[0xF3, 0x0A]);
        m.step_once()?;
        assert_eq!(m.snapshot()?.pc, 0x200);
        m.send_key(KeyEvent::Press(0x7));
        m.step_once()?;
        let snap = m.snapshot()?;
        assert_eq!(snap.registers[3].value, 0x7);
        assert_eq!(snap.pc, 0x202);
        assert!(snap.keys[0x7]);
        Ok(())
    }

    #[test]
    fn test_run_then_stop_is_quiet() -> Result<()> {
        // V0 += 1; jump back
        let mut m = machine(fast(), &[0x70, 0x01, 0x12, 0x00]);
        m.run()?;
        assert!(m.is_running());
        assert!(wait_for(|| m.snapshot().unwrap().registers[0].value > 0));
        m.stop()?;
        assert!(!m.is_running());
        let frozen = m.snapshot()?;
        thread::sleep(Duration::from_millis(20));
        let later = m.snapshot()?;
        assert_eq!(frozen.registers[0].value, later.registers[0].value);
        assert_eq!(frozen.pc, later.pc);
        Ok(())
    }

    #[test]
    fn test_run_twice_and_restart() -> Result<()> {
        let mut m = machine(fast(), &[0x12, 0x00]);
        m.run()?;
        m.run()?;
        match &m.lifecycle {
            Lifecycle::Running(a) => assert_eq!(a.handles.len(), 3),
            Lifecycle::Stopped => panic!("should be running"),
        }
        m.stop()?;
        m.stop()?;
        assert!(!m.is_running());
        m.run()?;
        assert!(m.is_running());
        m.stop()
    }

    #[test]
    fn test_timer_activity_counts_down() -> Result<()> {
        // V0 = 5; delay = V0; spin
        let mut m = machine(fast(), &[0x60, 0x05, 0xF0, 0x15, 0x12, 0x04]);
        m.step_once()?;
        m.step_once()?;
        assert_eq!(m.snapshot()?.delay_timer, 5);
        m.run()?;
        assert!(wait_for(|| m.snapshot().unwrap().delay_timer == 0));
        thread::sleep(Duration::from_millis(10));
        m.stop()?;
        assert_eq!(m.snapshot()?.delay_timer, 0);
        Ok(())
    }

    #[test]
    fn test_timers_and_keypad_run_while_cpu_waits_for_key() -> Result<()> {
        // V0 = 5; delay = V0; V3 = wait for key; spin
        let mut m = machine(fast(), &[0x60, 0x05, 0xF0, 0x15, 0xF3, 0x0A, 0x12, 0x06]);
        m.run()?;
        assert!(wait_for(|| {
            let s = m.snapshot().unwrap();
            s.pc == 0x204 && s.delay_timer == 0
        }));
        // still waiting on FX0A
        thread::sleep(Duration::from_millis(10));
        assert_eq!(m.snapshot()?.pc, 0x204);

        m.send_key(KeyEvent::Press(0x9));
        assert!(wait_for(|| m.snapshot().unwrap().pc == 0x206));
        assert_eq!(m.snapshot()?.registers[3].value, 0x9);
        m.stop()
    }

    #[test]
    fn test_keypad_activity_applies_events() -> Result<()> {
        let mut m = machine(fast(), &[0x12, 0x00]);
        m.run()?;
        m.send_key(KeyEvent::Press(0xB));
        assert!(wait_for(|| m.snapshot().unwrap().keys[0xB]));
        m.send_key(KeyEvent::Release(0xB));
        assert!(wait_for(|| !m.snapshot().unwrap().keys[0xB]));
        m.stop()
    }

    #[test]
    fn test_fault_halts_run_and_is_reported() {
        let (frontend, updates) = ChannelFrontend::new(1024);
        let mut m = Machine::new(fast(), Arc::new(frontend));
        m.load_program(&mut [0x00u8, 0xEE].as_slice()).unwrap();
        m.run().unwrap();
        assert!(wait_for(|| m.has_halted()));
        assert!(!m.is_running());
        assert!(matches!(m.stop(), Err(Error::StackUnderflow { pc: 0x200 })));
        assert!(updates
            .try_iter()
            .any(|u| matches!(u, Update::Fault(_))));
        // once reaped the machine is simply stopped
        assert!(m.stop().is_ok());
    }

    #[test]
    fn test_refresh_keys_auto_clear() {
        let mut state = State::new();
        let t0 = Instant::now();
        let window = Some(Duration::from_millis(50));
        assert!(refresh_keys(&mut state, vec![KeyEvent::Press(2)], window, t0));
        assert!(!refresh_keys(&mut state, vec![], window, t0 + Duration::from_millis(10)));
        assert!(state.keypad().is_pressed(2));
        assert!(refresh_keys(&mut state, vec![], window, t0 + Duration::from_millis(51)));
        assert!(!state.keypad().is_pressed(2));
    }

    #[test]
    fn test_refresh_keys_without_auto_clear_keeps_keys() {
        let mut state = State::new();
        let t0 = Instant::now();
        refresh_keys(&mut state, vec![KeyEvent::Press(2)], None, t0);
        assert!(!refresh_keys(&mut state, vec![], None, t0 + Duration::from_secs(60)));
        assert!(state.keypad().is_pressed(2));
    }
}
