//! Inspection and manipulation of the daemon's lifetime.

use tokio::sync::broadcast;

/// Powerctld's lifetime manager.
#[derive(Debug)]
pub struct System(broadcast::Sender<Event>);
impl System {
    /// Creates a new instance with default settings.
    pub fn new() -> Self {
        Self(broadcast::channel(1).0)
    }

    /// Creates a new [`broadcast::Receiver`] handle that will receive events
    /// sent after this call to `subscribe`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.0.subscribe()
    }

    /// Makes `powerctld` exit.
    pub fn exit(&self, code: i32) {
        self.0.send(Event::Exit(code)).ok();
    }
}
impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

/// An event related to the daemon's lifetime.
#[derive(Debug, Clone)]
pub enum Event {
    /// Makes `powerctld` exit.
    Exit(i32),
}
impl Event {
    /// Handles the event.
    pub fn handle(&self) -> ! {
        match self {
            Self::Exit(code) => std::process::exit(*code),
        }
    }
}
