//! Signal bus of the powerctld surface.

use powerctl_sdk::state::Signal;

/// The signal bus.
///
/// Property-change signals are broadcast to every subscriber; a slow
/// subscriber loses the oldest signals rather than stalling the publisher.
#[derive(Debug)]
pub struct Bus {
    sender: async_broadcast::Sender<Signal>,
    _keep: async_broadcast::InactiveReceiver<Signal>,
}
impl Bus {
    /// Creates a new [`Bus`] instance.
    pub fn new() -> Self {
        let (mut sender, receiver) = async_broadcast::broadcast(64);
        sender.set_overflow(true);
        Self {
            sender,
            _keep: receiver.deactivate(),
        }
    }

    /// Subscribes to the bus.
    pub fn subscribe(&self) -> async_broadcast::Receiver<Signal> {
        self.sender.new_receiver()
    }

    /// Triggers a signal in the bus.
    pub fn trigger(&self, signal: Signal) {
        self.sender.try_broadcast(signal).ok();
    }
}
impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
