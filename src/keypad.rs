use std::time::{Duration, Instant};

/// number of keys on the hex keypad
pub const KEY_COUNT: usize = 16;

/// A key going down or coming up. Keys are 0x0-0xF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Press(u8),
    Release(u8),
}

impl KeyEvent {
    pub fn key(&self) -> u8 {
        match *self {
            KeyEvent::Press(k) | KeyEvent::Release(k) => k,
        }
    }
}

/// The state of the sixteen key hex keypad.
#[derive(Clone, Debug, Default)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
    last_event: Option<Instant>,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// apply an event, returning true if any key changed state
    pub fn apply(&mut self, event: KeyEvent, now: Instant) -> bool {
        let key = event.key() as usize;
        if key >= KEY_COUNT {
            log::warn!("ignoring event for key 0x{:02X}, keypad has 16 keys", key);
            return false;
        }
        self.last_event = Some(now);
        let down = matches!(event, KeyEvent::Press(_));
        let changed = self.keys[key] != down;
        self.keys[key] = down;
        changed
    }

    /// keys outside 0x0-0xF are never pressed
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// the lowest numbered key currently down
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|k| *k).map(|k| k as u8)
    }

    /// release everything, returning true if anything was down
    pub fn clear_all(&mut self) -> bool {
        let any = self.keys.iter().any(|k| *k);
        self.keys = [false; KEY_COUNT];
        any
    }

    /// release everything if no event has arrived for `window`
    pub fn expire(&mut self, window: Duration, now: Instant) -> bool {
        match self.last_event {
            Some(at) if now.saturating_duration_since(at) >= window => {
                self.last_event = None;
                self.clear_all()
            }
            _ => false,
        }
    }

    pub fn keys(&self) -> [bool; KEY_COUNT] {
        self.keys
    }
}

/// one `0: up` / `A: DOWN` line per key
pub fn key_rows(keys: &[bool; KEY_COUNT]) -> Vec<String> {
    keys.iter()
        .enumerate()
        .map(|(k, down)| format!("{:X}: {}", k, if *down { "DOWN" } else { "up" }))
        .collect()
}
