//! # The host power sequencer
//! Main module wiring the GPIO adapter, the timer wheel and the state machine
//! together and exposing a handle the rest of the daemon talks through.

pub mod gpio;
pub mod machine;
pub mod restore;
pub mod timers;

pub use machine::{Event, PowerState};

use crate::storage::PowerDropStore;
use crate::surface::Surface;
use anyhow::anyhow;
use machine::{Input, Machine};
use powerctl_sdk::state::{ButtonId, OsState};
use powerctl_sdk::Error;
use powerfx::gpio::{Edge, GpioBackend, Line};
use powerfx::i2c::I2cMaster;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Everything the sequencer needs at startup.
pub struct Options {
    pub backend: Arc<dyn GpioBackend>,
    pub i2c: Arc<dyn I2cMaster>,
    pub surface: Arc<Surface>,
    pub power_drop: PowerDropStore,
    /// Whether the SIO latched a power failure for this boot.
    pub ac_boot: bool,
}

/// A handle to the running power sequencer.
#[derive(Debug, Clone)]
pub struct Manager {
    tx: mpsc::UnboundedSender<Input>,
}
impl Manager {
    /// Requests the mandatory lines, computes the initial state, spawns the
    /// line watchers and the machine task.
    ///
    /// Fails if any mandatory input line cannot be acquired; the platform is
    /// not supported then.
    pub async fn start(options: Options) -> anyhow::Result<Self> {
        let backend = options.backend.clone();

        let mut pgood = 0;
        let mut post = 1;
        for line in gpio::INPUT_LINES {
            let level = backend
                .request_input(line)
                .await
                .map_err(|err| anyhow!("cannot request gpio line `{}`: {err}", line.name))?;
            match line.name {
                "PS_PWROK" => pgood = level,
                "POST_COMPLETE" => post = level,
                _ => {}
            }
        }

        let state = match (pgood, options.ac_boot) {
            (1, _) => PowerState::On,
            (_, true) => PowerState::AcLossOff,
            (_, false) => PowerState::Off,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut machine = Machine::new(
            state,
            gpio::GpioAdapter::new(backend.clone()),
            timers::TimerWheel::new(tx.clone()),
            options.surface.clone(),
            options.power_drop,
            options.i2c,
            options.ac_boot,
        );
        if options.ac_boot && state == PowerState::On {
            // The platform powered the host back up before we came around.
            machine.log_dc_power_on();
        }

        options
            .surface
            .set_power_state(state.host_state(), state.chassis_state());
        options.surface.set_os_state(match post {
            0 => OsState::Standby,
            _ => OsState::Inactive,
        });
        tracing::info!(target: "console", "host power is {:?}", state);

        // Sequencing inputs.
        for line in [gpio::PS_PWROK, gpio::SIO_POWER_GOOD, gpio::SIO_S5] {
            let rx_edges = backend.subscribe(line).await?;
            forward_line(line, rx_edges, tx.clone());
        }
        // POST completion only moves the OS state projection.
        forward_post(backend.subscribe(gpio::POST_COMPLETE).await?, tx.clone());
        // SIO_ONCONTROL is observed for the journal only.
        watch_oncontrol(backend.subscribe(gpio::SIO_ONCONTROL).await?);
        // Front-panel buttons.
        for (line, id) in [
            (gpio::POWER_BUTTON, ButtonId::Power),
            (gpio::RESET_BUTTON, ButtonId::Reset),
            (gpio::NMI_BUTTON, ButtonId::Nmi),
            (gpio::ID_BUTTON, ButtonId::Id),
        ] {
            forward_button(id, backend.subscribe(line).await?, tx.clone());
        }

        tokio::spawn(machine.run(rx));

        Ok(Self { tx })
    }

    /// Applies `event`, waiting until its effects are visible.
    pub async fn request(&self, event: Event) -> Result<(), Error> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Input::Event(event, Some(ack_tx)))
            .map_err(|_| Error::internal("power sequencer is gone"))?;
        ack_rx
            .await
            .map_err(|_| Error::internal("power sequencer dropped the request"))
    }

    /// (Un)masks a front-panel button.
    pub async fn set_button_mask(&self, id: ButtonId, masked: bool) -> Result<(), Error> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Input::SetMask(id, masked, ack_tx))
            .map_err(|_| Error::internal("power sequencer is gone"))?;
        ack_rx
            .await
            .map_err(|_| Error::internal("power sequencer dropped the request"))?
            .map_err(|err| Error::io(&err))
    }

    /// Schedules the power restore decision `delay` from now.
    pub fn arm_restore(&self, policy: powerctl_sdk::state::RestorePolicy, delay: Duration) {
        self.tx.send(Input::ArmRestore(policy, delay)).ok();
    }

    /// Returns the current authoritative power state.
    pub async fn query(&self) -> Result<PowerState, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Input::Query(reply_tx))
            .map_err(|_| Error::internal("power sequencer is gone"))?;
        reply_rx
            .await
            .map_err(|_| Error::internal("power sequencer dropped the request"))
    }

    /// Waits until every input posted before this call has been applied.
    pub async fn settle(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Input::Sync(ack_tx)).is_ok() {
            ack_rx.await.ok();
        }
    }
}

fn forward_line(line: Line, mut edges: mpsc::UnboundedReceiver<Edge>, tx: mpsc::UnboundedSender<Input>) {
    tokio::spawn(async move {
        while let Some(edge) = edges.recv().await {
            let event = match (line.name, edge) {
                ("PS_PWROK", Edge::Rising) => Event::PsPowerOkAssert,
                ("PS_PWROK", Edge::Falling) => Event::PsPowerOkDeassert,
                ("SIO_POWER_GOOD", Edge::Rising) => Event::SioPowerGoodAssert,
                ("SIO_POWER_GOOD", Edge::Falling) => Event::SioPowerGoodDeassert,
                // S5 is entered on the falling edge.
                ("SIO_S5", Edge::Falling) => Event::SioS5Assert,
                ("SIO_S5", Edge::Rising) => Event::SioS5Deassert,
                _ => continue,
            };
            if tx.send(Input::Event(event, None)).is_err() {
                break;
            }
        }
    });
}

fn forward_post(mut edges: mpsc::UnboundedReceiver<Edge>, tx: mpsc::UnboundedSender<Input>) {
    tokio::spawn(async move {
        while let Some(edge) = edges.recv().await {
            if tx.send(Input::Post(edge)).is_err() {
                break;
            }
        }
    });
}

fn forward_button(id: ButtonId, mut edges: mpsc::UnboundedReceiver<Edge>, tx: mpsc::UnboundedSender<Input>) {
    tokio::spawn(async move {
        while let Some(edge) = edges.recv().await {
            if tx.send(Input::Button(id, edge)).is_err() {
                break;
            }
        }
    });
}

fn watch_oncontrol(mut edges: mpsc::UnboundedReceiver<Edge>) {
    tokio::spawn(async move {
        while let Some(edge) = edges.recv().await {
            match edge {
                Edge::Falling => tracing::info!("SIO_ONCONTROL asserted"),
                Edge::Rising => tracing::info!("SIO_ONCONTROL deasserted"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PowerDropStore;
    use powerctl_sdk::state::{HostState, RestorePolicy};
    use powerfx::gpio::sim::SimGpio;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct SimI2c {
        writes: Mutex<Vec<(u8, u16, u8, u8)>>,
    }
    impl I2cMaster for SimI2c {
        fn write_byte(&self, bus: u8, addr: u16, reg: u8, value: u8) -> std::io::Result<()> {
            self.writes.lock().unwrap().push((bus, addr, reg, value));
            Ok(())
        }
    }

    struct Fixture {
        gpio: Arc<SimGpio>,
        i2c: Arc<SimI2c>,
        surface: Arc<Surface>,
        power: Manager,
        store: PowerDropStore,
    }
    impl Fixture {
        /// Lets the line watchers forward pending edges, then drains the
        /// machine's input queue.
        async fn sync(&self) {
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            self.power.settle().await;
        }

        async fn state(&self) -> PowerState {
            self.power.query().await.unwrap()
        }

        async fn i2c_writes(&self) -> Vec<(u8, u16, u8, u8)> {
            self.i2c.writes.lock().unwrap().clone()
        }
    }

    async fn fixture(name: &str, pgood: u8, ac_boot: bool) -> Fixture {
        let dir = std::path::PathBuf::from(format!("/tmp/.powerctld-test-{name}"));
        _ = tokio::fs::remove_dir_all(&dir).await;
        let store = PowerDropStore::new(dir).await;

        let gpio = SimGpio::new();
        for line in gpio::INPUT_LINES {
            gpio.preset(line, 1);
        }
        gpio.preset(gpio::PS_PWROK, pgood);
        gpio.preset(gpio::SIO_POWER_GOOD, pgood);

        let i2c = Arc::new(SimI2c::default());
        let surface = Arc::new(Surface::new());
        let power = Manager::start(Options {
            backend: gpio.clone(),
            i2c: i2c.clone(),
            surface: surface.clone(),
            power_drop: store.clone(),
            ac_boot,
        })
        .await
        .unwrap();
        power.settle().await;

        Fixture {
            gpio,
            i2c,
            surface,
            power,
            store,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_sequence() {
        let f = fixture("power-on", 0, false).await;
        assert_eq!(f.state().await, PowerState::Off);
        assert_eq!(f.surface.query_host().current_host_state, HostState::Off);

        f.power.request(Event::PowerOnRequest).await.unwrap();
        assert_eq!(f.state().await, PowerState::WaitForPsPowerOk);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0]);

        // A second request while already waiting adds no pulse.
        f.power.request(Event::PowerOnRequest).await.unwrap();
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0]);

        f.gpio.set_level(gpio::PS_PWROK, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::WaitForSioPowerGood);
        // The assert timer was cancelled, driving the line back high.
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1]);

        f.gpio.set_level(gpio::SIO_POWER_GOOD, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::On);
        assert_eq!(f.surface.query_host().current_host_state, HostState::Running);

        // Both watchdogs are gone; nothing fires later.
        tokio::time::sleep(Duration::from_secs(30)).await;
        f.sync().await;
        assert_eq!(f.state().await, PowerState::On);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn ps_pwrok_watchdog_expires() {
        let f = fixture("ps-watchdog", 0, false).await;
        f.power.request(Event::PowerOnRequest).await.unwrap();
        tokio::time::sleep(Duration::from_secs(9)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::FailedTransitionToOn);

        // Power good showing up late must trigger a force-off pulse, never a
        // transition to On.
        f.gpio.set_level(gpio::PS_PWROK, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::FailedTransitionToOn);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT).last(), Some(&0));

        // The force-off pulse is interrupted by the supply dropping; no I²C
        // fallback may fire afterwards.
        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.sync().await;
        tokio::time::sleep(Duration::from_secs(20)).await;
        f.power.settle().await;
        assert!(f.i2c_writes().await.is_empty());

        // A new power-on request leaves the failed state.
        f.power.request(Event::PowerOnRequest).await.unwrap();
        assert_eq!(f.state().await, PowerState::WaitForPsPowerOk);
    }

    #[tokio::test(start_paused = true)]
    async fn sio_watchdog_expires() {
        let f = fixture("sio-watchdog", 0, false).await;
        f.power.request(Event::PowerOnRequest).await.unwrap();
        f.gpio.set_level(gpio::PS_PWROK, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::WaitForSioPowerGood);

        tokio::time::sleep(Duration::from_secs(2)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::FailedTransitionToOn);
        // Entering the failed state kicked off a force-off pulse.
        assert_eq!(f.gpio.drives(gpio::POWER_OUT).last(), Some(&0));
    }

    #[tokio::test(start_paused = true)]
    async fn sio_power_good_beats_its_watchdog() {
        let f = fixture("sio-boundary", 0, false).await;
        f.power.request(Event::PowerOnRequest).await.unwrap();
        f.gpio.set_level(gpio::PS_PWROK, 1);
        f.sync().await;

        // Delivered before the watchdog completion is processed: the
        // transition completes and the stale completion is dropped.
        f.gpio.set_level(gpio::SIO_POWER_GOOD, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::On);
        tokio::time::sleep(Duration::from_secs(5)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_shutdown_completes() {
        let f = fixture("graceful-off", 1, false).await;
        assert_eq!(f.state().await, PowerState::On);

        f.power
            .request(Event::GracefulPowerOffRequest)
            .await
            .unwrap();
        assert_eq!(f.state().await, PowerState::GracefulTransitionToOff);
        // Still projected as running while the host shuts down.
        assert_eq!(f.surface.query_host().current_host_state, HostState::Running);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0]);

        // The notify pulse releases after 200 ms.
        tokio::time::sleep(Duration::from_millis(300)).await;
        f.power.settle().await;
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1]);

        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::Off);
        assert_eq!(f.surface.query_host().current_host_state, HostState::Off);
        assert!(!f.store.read().await);
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_shutdown_abandoned() {
        let f = fixture("graceful-timeout", 1, false).await;

        // The physical button starts the graceful flow without a pulse from
        // us; the hardware passes the press through.
        f.gpio.set_level(gpio::POWER_BUTTON, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::GracefulTransitionToOff);
        assert!(f.gpio.drives(gpio::POWER_OUT).is_empty());

        // The host never shuts down; after 60 s we are back to On.
        tokio::time::sleep(Duration::from_secs(61)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::On);
        assert!(!f.store.read().await);

        // Prove we are really in On: an unexpected supply drop now records a
        // power drop.
        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::Off);
        assert!(f.store.read().await);
    }

    #[tokio::test(start_paused = true)]
    async fn unplanned_power_loss_and_recovery() {
        let f = fixture("ps-loss", 1, false).await;

        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.gpio.set_level(gpio::SIO_POWER_GOOD, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::Off);
        assert!(f.store.read().await);

        f.gpio.set_level(gpio::PS_PWROK, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::WaitForSioPowerGood);
        assert!(!f.store.read().await);

        f.gpio.set_level(gpio::SIO_POWER_GOOD, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_off_uses_i2c_fallback() {
        let f = fixture("force-off", 1, false).await;

        f.power.request(Event::PowerOffRequest).await.unwrap();
        assert_eq!(f.state().await, PowerState::TransitionToOff);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0]);

        // The override pulse runs its full 15 s without PS_PWROK dropping:
        // the unconditional power-down goes out, exactly once.
        tokio::time::sleep(Duration::from_secs(16)).await;
        f.power.settle().await;
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1]);
        assert_eq!(f.i2c_writes().await, vec![(3, 0x44, 0, 0x02)]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        f.power.settle().await;
        assert_eq!(f.i2c_writes().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_off_interrupted_skips_fallback() {
        let f = fixture("force-off-ok", 1, false).await;

        f.power.request(Event::PowerOffRequest).await.unwrap();
        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::Off);
        // Cancellation released the line before the 15 s ran out.
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        f.power.settle().await;
        assert!(f.i2c_writes().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn power_cycle() {
        let f = fixture("power-cycle", 1, false).await;

        f.power.request(Event::PowerCycleRequest).await.unwrap();
        assert_eq!(f.state().await, PowerState::TransitionToCycleOff);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0]);

        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.gpio.set_level(gpio::SIO_POWER_GOOD, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::CycleOff);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1]);

        // After the 1 s off period the power-on pulse goes out.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::WaitForPsPowerOk);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0, 1, 0]);

        f.gpio.set_level(gpio::PS_PWROK, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::WaitForSioPowerGood);
        f.gpio.set_level(gpio::SIO_POWER_GOOD, 1);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::On);
        assert!(!f.store.read().await);
    }

    #[tokio::test(start_paused = true)]
    async fn s5_entry_powers_off() {
        let f = fixture("s5", 1, false).await;

        f.gpio.set_level(gpio::SIO_S5, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::TransitionToOff);

        f.gpio.set_level(gpio::PS_PWROK, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::Off);
        assert!(!f.store.read().await);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_request_pulses_without_state_change() {
        let f = fixture("reset", 1, false).await;

        f.power.request(Event::ResetRequest).await.unwrap();
        assert_eq!(f.state().await, PowerState::On);
        assert_eq!(f.gpio.drives(gpio::RESET_OUT), vec![0]);

        tokio::time::sleep(Duration::from_millis(600)).await;
        f.power.settle().await;
        assert_eq!(f.gpio.drives(gpio::RESET_OUT), vec![0, 1]);
        assert_eq!(f.state().await, PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn masked_power_button_is_inert() {
        let f = fixture("masked-button", 1, false).await;

        f.power
            .set_button_mask(powerctl_sdk::state::ButtonId::Power, true)
            .await
            .unwrap();
        assert!(f.surface.query_button(powerctl_sdk::state::ButtonId::Power).masked);
        // The mask holds the line at its inactive level.
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![1]);

        f.gpio.set_level(gpio::POWER_BUTTON, 0);
        f.sync().await;
        // The press is published but does not reach the sequencer.
        assert!(f.surface.query_button(powerctl_sdk::state::ButtonId::Power).pressed);
        assert_eq!(f.state().await, PowerState::On);

        f.gpio.set_level(gpio::POWER_BUTTON, 1);
        f.sync().await;
        assert!(!f.surface.query_button(powerctl_sdk::state::ButtonId::Power).pressed);

        // Unmasked again, the press starts the graceful flow.
        f.power
            .set_button_mask(powerctl_sdk::state::ButtonId::Power, false)
            .await
            .unwrap();
        f.gpio.set_level(gpio::POWER_BUTTON, 0);
        f.sync().await;
        assert_eq!(f.state().await, PowerState::GracefulTransitionToOff);
    }

    #[tokio::test(start_paused = true)]
    async fn pulses_route_through_a_held_mask() {
        let f = fixture("masked-pulse", 1, false).await;

        f.power
            .set_button_mask(powerctl_sdk::state::ButtonId::Power, true)
            .await
            .unwrap();
        f.power
            .request(Event::GracefulPowerOffRequest)
            .await
            .unwrap();
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![1, 0]);

        tokio::time::sleep(Duration::from_millis(300)).await;
        f.power.settle().await;
        // Released through the mask handle, which keeps holding the line.
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![1, 0, 1]);
        assert_eq!(f.gpio.output_requests(gpio::POWER_OUT), 1);
        assert!(f.surface.query_button(powerctl_sdk::state::ButtonId::Power).masked);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_button_press_is_surface_only() {
        let f = fixture("reset-button", 1, false).await;

        f.gpio.set_level(gpio::RESET_BUTTON, 0);
        f.sync().await;
        assert!(f.surface.query_button(powerctl_sdk::state::ButtonId::Reset).pressed);
        assert_eq!(f.state().await, PowerState::On);
        assert!(f.gpio.drives(gpio::RESET_OUT).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ac_loss_boot_restores_always_on() {
        let f = fixture("restore-always-on", 0, true).await;
        assert_eq!(f.state().await, PowerState::AcLossOff);

        f.power
            .arm_restore(RestorePolicy::AlwaysOn, Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::WaitForPsPowerOk);
        assert_eq!(f.gpio.drives(gpio::POWER_OUT), vec![0]);
        assert!(!f.store.read().await);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_policy_needs_a_recorded_drop() {
        let f = fixture("restore-no-drop", 0, true).await;
        f.power
            .arm_restore(RestorePolicy::Restore, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::AcLossOff);

        let f = fixture("restore-with-drop", 0, true).await;
        f.store.store().await;
        f.power
            .arm_restore(RestorePolicy::Restore, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        f.power.settle().await;
        assert_eq!(f.state().await, PowerState::WaitForPsPowerOk);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_flow_waits_for_settings() {
        let f = fixture("restore-wait", 0, true).await;
        restore::start(f.surface.clone(), f.power.clone());
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        // Still waiting; nothing armed.
        assert_eq!(f.state().await, PowerState::AcLossOff);

        f.surface.set_restore_policy(RestorePolicy::AlwaysOn);
        f.surface.set_restore_delay(0);
        tokio::time::sleep(Duration::from_secs(1)).await;
        f.sync().await;
        assert_eq!(f.state().await, PowerState::WaitForPsPowerOk);
    }

    #[tokio::test(start_paused = true)]
    async fn post_complete_projects_os_state() {
        use powerctl_sdk::state::OsState;

        let f = fixture("post", 1, false).await;
        assert_eq!(f.surface.query_os().operating_system_state, OsState::Inactive);

        f.gpio.set_level(gpio::POST_COMPLETE, 0);
        f.sync().await;
        assert_eq!(f.surface.query_os().operating_system_state, OsState::Standby);

        f.gpio.set_level(gpio::POST_COMPLETE, 1);
        f.sync().await;
        assert_eq!(f.surface.query_os().operating_system_state, OsState::Inactive);
    }
}
