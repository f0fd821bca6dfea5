//! One-shot timers of the power sequencer.
//!
//! Arming a timer replaces any prior arming of the same id. Cancellation is
//! best-effort: a completion that was already queued keeps its (now stale)
//! generation and is dropped by [`TimerWheel::accept`], so handlers observe it
//! as aborted.

use super::machine::Input;
use ahash::AHashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// The timers the power sequencer arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Releases the currently asserted output pulse.
    GpioAssert,
    /// Off period of a power cycle.
    PowerCycle,
    /// Limits how long a graceful shutdown may take.
    GracefulPowerOff,
    /// Watchdog for the power supply's power-good assertion.
    PsPowerOkWatchdog,
    /// Watchdog for the SIO power-good assertion.
    SioPowerGoodWatchdog,
    /// Delays the power restore policy after an AC-loss boot.
    PowerRestorePolicy,
}

#[derive(Debug)]
struct Slot {
    gen: u64,
    abort: AbortHandle,
}

/// The set of armed one-shot timers.
///
/// Owned by the state machine task; completions are posted back onto the
/// machine's input channel and never run concurrently with it.
#[derive(Debug)]
pub struct TimerWheel {
    tx: mpsc::UnboundedSender<Input>,
    slots: AHashMap<TimerId, Slot>,
    gen: u64,
}
impl TimerWheel {
    pub fn new(tx: mpsc::UnboundedSender<Input>) -> Self {
        Self {
            tx,
            slots: AHashMap::new(),
            gen: 0,
        }
    }

    /// Arms `id` to complete after `duration`, replacing any prior arming.
    pub fn arm(&mut self, id: TimerId, duration: Duration) {
        self.gen += 1;
        let gen = self.gen;
        let tx = self.tx.clone();
        let abort = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tx.send(Input::TimerExpired(id, gen)).ok();
        })
        .abort_handle();

        if let Some(old) = self.slots.insert(id, Slot { gen, abort }) {
            old.abort.abort();
        }
    }

    /// Cancels `id`. Cancelling an idle timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(slot) = self.slots.remove(&id) {
            slot.abort.abort();
        }
    }

    /// Accepts a delivered completion, returning whether it is current.
    ///
    /// A completion whose generation does not match the armed slot was
    /// cancelled after it was queued and must be ignored.
    pub fn accept(&mut self, id: TimerId, gen: u64) -> bool {
        match self.slots.get(&id) {
            Some(slot) if slot.gen == gen => {
                self.slots.remove(&id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancelled_completion_is_stale() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut wheel = TimerWheel::new(tx);

        wheel.arm(TimerId::PowerCycle, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let Some(Input::TimerExpired(id, gen)) = rx.recv().await else {
            panic!("expected a completion");
        };
        assert_eq!(id, TimerId::PowerCycle);

        // Cancel after the completion was queued: the handler must see it as
        // aborted.
        wheel.cancel(TimerId::PowerCycle);
        assert!(!wheel.accept(id, gen));

        // Re-arming invalidates completions of the prior arming.
        wheel.arm(TimerId::PowerCycle, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let Some(Input::TimerExpired(id, gen2)) = rx.recv().await else {
            panic!("expected a completion");
        };
        assert!(gen2 > gen);
        assert!(wheel.accept(id, gen2));
        // Double-accept (and double-cancel) are idempotent.
        assert!(!wheel.accept(id, gen2));
        wheel.cancel(TimerId::PowerCycle);
    }
}
