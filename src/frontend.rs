use crate::error::Error;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

/// Frontend is how the machine tells the outside world something worth
/// showing happened. It is handed to the machine once, at construction.
///
/// Calls come from the scheduler's activity threads, so implementations must
/// be quick and must not call back into the machine.
pub trait Frontend: Send + Sync {
    /// the frame buffer changed
    fn display_changed(&self);

    /// an instruction executed and registers or other CPU state moved on
    fn registers_changed(&self);

    /// the keypad state changed
    fn keys_changed(&self);

    /// the run stopped on a fatal error
    fn faulted(&self, error: &Error);
}

/// useful for testing and for running headless
pub struct NullFrontend;

impl Frontend for NullFrontend {
    fn display_changed(&self) {}
    fn registers_changed(&self) {}
    fn keys_changed(&self) {}
    fn faulted(&self, _error: &Error) {}
}

/// What changed, as seen by a `ChannelFrontend` receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    Display,
    Registers,
    Keys,
    Fault(String),
}

/// Turns notifications into `Update` messages on a bounded channel.
///
/// Updates are hints to redraw, so when the receiver falls behind and the
/// channel is full they are dropped rather than blocking the machine.
pub struct ChannelFrontend {
    tx: SyncSender<Update>,
}

impl ChannelFrontend {
    pub fn new(capacity: usize) -> (Self, Receiver<Update>) {
        let (tx, rx) = sync_channel(capacity);
        (ChannelFrontend { tx }, rx)
    }

    fn send(&self, update: Update) {
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(u)) => log::trace!("frontend busy, dropped {:?}", u),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Frontend for ChannelFrontend {
    fn display_changed(&self) {
        self.send(Update::Display)
    }

    fn registers_changed(&self) {
        self.send(Update::Registers)
    }

    fn keys_changed(&self) {
        self.send(Update::Keys)
    }

    // never block here: the caller may be joining the faulting thread.
    // The error itself is still returned by `Machine::stop`.
    fn faulted(&self, error: &Error) {
        self.send(Update::Fault(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_frontend_delivers_updates() {
        let (f, rx) = ChannelFrontend::new(4);
        f.display_changed();
        f.keys_changed();
        assert_eq!(rx.try_recv(), Ok(Update::Display));
        assert_eq!(rx.try_recv(), Ok(Update::Keys));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_frontend_drops_when_full() {
        let (f, rx) = ChannelFrontend::new(1);
        f.registers_changed();
        f.display_changed();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Update::Registers]);
    }

    #[test]
    fn test_fault_carries_message() {
        let (f, rx) = ChannelFrontend::new(1);
        f.faulted(&Error::StackUnderflow { pc: 0x200 });
        match rx.try_recv() {
            Ok(Update::Fault(msg)) => assert!(msg.contains("underflow")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_disconnected_receiver_is_ignored() {
        let (f, rx) = ChannelFrontend::new(1);
        drop(rx);
        f.display_changed();
    }
}
