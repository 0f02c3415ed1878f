use std::time::Duration;

/// default instruction rate, roughly what most CHIP-8 games expect
pub const DEFAULT_CLOCK_HZ: u32 = 700;
/// the delay and sound timers always count down at 60Hz on real hardware
pub const DEFAULT_TIMER_HZ: u32 = 60;
pub const DEFAULT_KEYPAD_HZ: u32 = 500;

/// Knobs for the scheduler and the few interpreter behaviours that differ
/// between CHIP-8 implementations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// instructions executed per second
    pub clock_hz: u32,
    /// delay/sound timer decrements per second
    pub timer_hz: u32,
    /// how often queued key events are applied
    pub keypad_hz: u32,
    /// release every key if no key event arrived within this window
    pub key_auto_clear: Option<Duration>,
    /// FX55/FX65 leave I pointing past the last register copied
    pub load_store_increments_index: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock_hz: DEFAULT_CLOCK_HZ,
            timer_hz: DEFAULT_TIMER_HZ,
            keypad_hz: DEFAULT_KEYPAD_HZ,
            key_auto_clear: None,
            load_store_increments_index: false,
        }
    }
}

impl Config {
    pub fn clock_period(&self) -> Duration {
        period(self.clock_hz)
    }

    pub fn timer_period(&self) -> Duration {
        period(self.timer_hz)
    }

    pub fn keypad_period(&self) -> Duration {
        period(self.keypad_hz)
    }
}

fn period(hz: u32) -> Duration {
    Duration::from_secs(1) / hz.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates() {
        let c = Config::default();
        assert_eq!(c.timer_period(), Duration::from_nanos(16_666_666));
        assert!(c.clock_period() < c.timer_period());
        assert_eq!(c.key_auto_clear, None);
        assert!(!c.load_store_increments_index);
    }

    #[test]
    fn test_zero_rate_clamped() {
        let c = Config {
            clock_hz: 0,
            ..Config::default()
        };
        assert_eq!(c.clock_period(), Duration::from_secs(1));
    }
}
