//! The host power state machine.
//!
//! One task owns the machine and consumes every stimulus — line edges, raw
//! button presses, timer completions and external requests — from a single
//! channel, so transitions are fully serialised and the core needs no locks.

use super::gpio::{self, GpioAdapter};
use super::timers::{TimerId, TimerWheel};
use crate::storage::PowerDropStore;
use crate::surface::Surface;
use powerctl_sdk::state::{ButtonId, ChassisPowerState, HostState, OsState, RestorePolicy};
use powerfx::gpio::{Edge, Line};
use powerfx::i2c::I2cMaster;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

// Platform timing contract.
pub const POWER_PULSE: Duration = Duration::from_millis(200);
pub const FORCE_OFF_PULSE: Duration = Duration::from_millis(15_000);
pub const RESET_PULSE: Duration = Duration::from_millis(500);
pub const POWER_CYCLE_OFF: Duration = Duration::from_millis(1_000);
pub const SIO_POWER_GOOD_WATCHDOG: Duration = Duration::from_millis(1_000);
pub const PS_PWROK_WATCHDOG: Duration = Duration::from_millis(8_000);
pub const GRACEFUL_POWER_OFF: Duration = Duration::from_millis(60_000);

// The PCH unconditional power-down command, issued over I²C when the power
// override pulse fails to bring the supply down.
const PCH_BUS: u8 = 3;
const PCH_ADDR: u16 = 0x44;
const PCH_CMD_REG: u8 = 0;
const PCH_POWER_DOWN_CMD: u8 = 0x02;

/// The authoritative host power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    WaitForPsPowerOk,
    WaitForSioPowerGood,
    FailedTransitionToOn,
    Off,
    AcLossOff,
    TransitionToOff,
    GracefulTransitionToOff,
    CycleOff,
    TransitionToCycleOff,
    GracefulTransitionToCycleOff,
}
impl PowerState {
    /// Projects the `CurrentHostState` property.
    pub fn host_state(self) -> HostState {
        match self {
            Self::On
            | Self::TransitionToOff
            | Self::GracefulTransitionToOff
            | Self::TransitionToCycleOff
            | Self::GracefulTransitionToCycleOff => HostState::Running,
            _ => HostState::Off,
        }
    }

    /// Projects the `CurrentPowerState` property.
    pub fn chassis_state(self) -> ChassisPowerState {
        match self.host_state() {
            HostState::Running => ChassisPowerState::On,
            HostState::Off => ChassisPowerState::Off,
        }
    }
}

/// A stimulus consumed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PsPowerOkAssert,
    PsPowerOkDeassert,
    SioPowerGoodAssert,
    SioPowerGoodDeassert,
    SioS5Assert,
    SioS5Deassert,
    PowerButtonPressed,
    PowerCycleTimerExpired,
    PsPowerOkWatchdogTimerExpired,
    SioPowerGoodWatchdogTimerExpired,
    GracefulPowerOffTimerExpired,
    PowerOnRequest,
    PowerOffRequest,
    PowerCycleRequest,
    ResetRequest,
    GracefulPowerOffRequest,
    GracefulPowerCycleRequest,
}

impl From<powerctl_sdk::state::HostTransition> for Event {
    fn from(transition: powerctl_sdk::state::HostTransition) -> Self {
        use powerctl_sdk::state::HostTransition;
        match transition {
            HostTransition::On => Self::PowerOnRequest,
            HostTransition::Off => Self::GracefulPowerOffRequest,
            HostTransition::Reboot => Self::GracefulPowerCycleRequest,
        }
    }
}
impl From<powerctl_sdk::state::ChassisTransition> for Event {
    fn from(transition: powerctl_sdk::state::ChassisTransition) -> Self {
        use powerctl_sdk::state::ChassisTransition;
        match transition {
            ChassisTransition::On => Self::PowerOnRequest,
            ChassisTransition::Off => Self::PowerOffRequest,
            ChassisTransition::PowerCycle => Self::PowerCycleRequest,
            ChassisTransition::Reset => Self::ResetRequest,
        }
    }
}

/// A message on the machine's input channel.
#[derive(Debug)]
pub(crate) enum Input {
    /// An event, acknowledged once its effects are applied if a sender is
    /// attached.
    Event(Event, Option<oneshot::Sender<()>>),
    /// A raw front-panel button edge.
    Button(ButtonId, Edge),
    /// A `POST_COMPLETE` edge.
    Post(Edge),
    /// A timer completion, tagged with its arming generation.
    TimerExpired(TimerId, u64),
    /// (Un)masks a front-panel button.
    SetMask(ButtonId, bool, oneshot::Sender<std::io::Result<()>>),
    /// Schedules the power restore policy decision.
    ArmRestore(RestorePolicy, Duration),
    /// Reports the current authoritative state.
    Query(oneshot::Sender<PowerState>),
    /// Acknowledged once every input posted before it has been applied.
    Sync(oneshot::Sender<()>),
}

/// An asserted output pulse awaiting its timed release.
#[derive(Debug, Clone, Copy)]
struct Pulse {
    line: Line,
    /// Issue the PCH power-down if the release timer expires uninterrupted.
    powerdown_fallback: bool,
}

pub(crate) struct Machine {
    state: PowerState,
    gpio: GpioAdapter,
    wheel: TimerWheel,
    surface: Arc<Surface>,
    power_drop: PowerDropStore,
    i2c: Arc<dyn I2cMaster>,
    active_pulse: Option<Pulse>,
    nmi_masked: bool,
    pending_restore: Option<RestorePolicy>,
    /// Set while the DC-power-on Redfish record is still owed for this boot.
    ac_loss_record_pending: bool,
}
impl Machine {
    pub(crate) fn new(
        state: PowerState,
        gpio: GpioAdapter,
        wheel: TimerWheel,
        surface: Arc<Surface>,
        power_drop: PowerDropStore,
        i2c: Arc<dyn I2cMaster>,
        ac_boot: bool,
    ) -> Self {
        Self {
            state,
            gpio,
            wheel,
            surface,
            power_drop,
            i2c,
            active_pulse: None,
            nmi_masked: false,
            pending_restore: None,
            ac_loss_record_pending: ac_boot,
        }
    }

    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Input>) {
        while let Some(input) = rx.recv().await {
            self.handle(input).await;
        }
    }

    pub(crate) async fn handle(&mut self, input: Input) {
        match input {
            Input::Event(event, ack) => {
                self.dispatch(event).await;
                if let Some(ack) = ack {
                    ack.send(()).ok();
                }
            }
            Input::Button(id, edge) => self.button_edge(id, edge).await,
            Input::Post(edge) => {
                // POST_COMPLETE is asserted at logical 0.
                let os = match edge {
                    Edge::Falling => OsState::Standby,
                    Edge::Rising => OsState::Inactive,
                };
                self.surface.set_os_state(os);
            }
            Input::TimerExpired(id, gen) => {
                if !self.wheel.accept(id, gen) {
                    tracing::trace!("dropping aborted completion of {:?}", id);
                    return;
                }
                self.timer_expired(id).await;
            }
            Input::SetMask(id, masked, ack) => {
                let result = self.set_button_mask(id, masked).await;
                ack.send(result).ok();
            }
            Input::ArmRestore(policy, delay) => {
                tracing::info!(
                    target: "console",
                    "applying power restore policy {:?} in {}s",
                    policy,
                    delay.as_secs()
                );
                self.pending_restore = Some(policy);
                self.wheel.arm(TimerId::PowerRestorePolicy, delay);
            }
            Input::Query(reply) => {
                reply.send(self.state).ok();
            }
            Input::Sync(ack) => {
                ack.send(()).ok();
            }
        }
    }

    /// Applies one event to the transition table.
    async fn dispatch(&mut self, event: Event) {
        tracing::debug!("{:?} in {:?}", event, self.state);
        let from = self.state;
        match (self.state, event) {
            // On
            (PowerState::On, Event::PsPowerOkDeassert) => {
                // Power went away without anyone asking for it.
                self.power_drop.store().await;
                self.enter(PowerState::Off);
            }
            (PowerState::On, Event::SioS5Assert) => self.enter(PowerState::TransitionToOff),
            (PowerState::On, Event::PowerButtonPressed) => {
                self.wheel.arm(TimerId::GracefulPowerOff, GRACEFUL_POWER_OFF);
                self.enter(PowerState::GracefulTransitionToOff);
            }
            (PowerState::On, Event::PowerOffRequest) => {
                self.enter(PowerState::TransitionToOff);
                self.force_power_off().await;
            }
            (PowerState::On, Event::GracefulPowerOffRequest) => {
                self.wheel.arm(TimerId::GracefulPowerOff, GRACEFUL_POWER_OFF);
                self.pulse(gpio::POWER_OUT, POWER_PULSE).await;
                self.enter(PowerState::GracefulTransitionToOff);
            }
            (PowerState::On, Event::PowerCycleRequest) => {
                self.enter(PowerState::TransitionToCycleOff);
                self.force_power_off().await;
            }
            (PowerState::On, Event::GracefulPowerCycleRequest) => {
                self.wheel.arm(TimerId::GracefulPowerOff, GRACEFUL_POWER_OFF);
                self.pulse(gpio::POWER_OUT, POWER_PULSE).await;
                self.enter(PowerState::GracefulTransitionToCycleOff);
            }
            (PowerState::On, Event::ResetRequest) => {
                self.pulse(gpio::RESET_OUT, RESET_PULSE).await;
            }

            // WaitForPsPowerOk
            (PowerState::WaitForPsPowerOk, Event::PsPowerOkAssert) => {
                self.cancel_gpio_assert().await;
                self.wheel.cancel(TimerId::PsPowerOkWatchdog);
                self.wheel
                    .arm(TimerId::SioPowerGoodWatchdog, SIO_POWER_GOOD_WATCHDOG);
                self.enter(PowerState::WaitForSioPowerGood);
            }
            (PowerState::WaitForPsPowerOk, Event::PsPowerOkWatchdogTimerExpired) => {
                self.enter(PowerState::FailedTransitionToOn);
            }

            // WaitForSioPowerGood
            (PowerState::WaitForSioPowerGood, Event::SioPowerGoodAssert) => {
                self.wheel.cancel(TimerId::SioPowerGoodWatchdog);
                self.enter(PowerState::On);
            }
            (PowerState::WaitForSioPowerGood, Event::SioPowerGoodWatchdogTimerExpired) => {
                self.enter(PowerState::FailedTransitionToOn);
                self.force_power_off().await;
            }

            // FailedTransitionToOn
            (PowerState::FailedTransitionToOn, Event::PsPowerOkAssert) => {
                // The platform must not come up on its own after a failed
                // transition.
                self.force_power_off().await;
            }
            (PowerState::FailedTransitionToOn, Event::PsPowerOkDeassert) => {
                self.cancel_gpio_assert().await;
            }
            (PowerState::FailedTransitionToOn, Event::PowerButtonPressed) => {
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
            }
            (PowerState::FailedTransitionToOn, Event::PowerOnRequest) => {
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
                self.pulse(gpio::POWER_OUT, POWER_PULSE).await;
            }

            // Off
            (PowerState::Off, Event::PsPowerOkAssert) => {
                self.power_drop.clear().await;
                self.enter(PowerState::WaitForSioPowerGood);
            }
            (PowerState::Off, Event::PowerButtonPressed) => {
                self.power_drop.clear().await;
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
            }
            (PowerState::Off, Event::PowerOnRequest) => {
                self.power_drop.clear().await;
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
                self.pulse(gpio::POWER_OUT, POWER_PULSE).await;
            }

            // AcLossOff behaves like Off, with the DC-power-on record emitted
            // ahead of each valid transition.
            (PowerState::AcLossOff, Event::PsPowerOkAssert) => {
                self.log_dc_power_on();
                self.power_drop.clear().await;
                self.enter(PowerState::WaitForSioPowerGood);
            }
            (PowerState::AcLossOff, Event::PowerButtonPressed) => {
                self.log_dc_power_on();
                self.power_drop.clear().await;
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
            }
            (PowerState::AcLossOff, Event::PowerOnRequest) => {
                self.log_dc_power_on();
                self.power_drop.clear().await;
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
                self.pulse(gpio::POWER_OUT, POWER_PULSE).await;
            }

            // TransitionToOff
            (PowerState::TransitionToOff, Event::PsPowerOkDeassert) => {
                self.cancel_gpio_assert().await;
                self.enter(PowerState::Off);
            }

            // GracefulTransitionToOff
            (PowerState::GracefulTransitionToOff, Event::PsPowerOkDeassert) => {
                self.wheel.cancel(TimerId::GracefulPowerOff);
                self.enter(PowerState::Off);
            }
            (PowerState::GracefulTransitionToOff, Event::GracefulPowerOffTimerExpired) => {
                // The host declined to shut down.
                self.enter(PowerState::On);
            }

            // CycleOff
            (PowerState::CycleOff, Event::PowerCycleTimerExpired) => {
                self.wheel.arm(TimerId::PsPowerOkWatchdog, PS_PWROK_WATCHDOG);
                self.enter(PowerState::WaitForPsPowerOk);
                self.pulse(gpio::POWER_OUT, POWER_PULSE).await;
            }

            // TransitionToCycleOff
            (PowerState::TransitionToCycleOff, Event::PsPowerOkDeassert) => {
                self.cancel_gpio_assert().await;
                self.enter(PowerState::CycleOff);
                self.wheel.arm(TimerId::PowerCycle, POWER_CYCLE_OFF);
            }

            // GracefulTransitionToCycleOff
            (PowerState::GracefulTransitionToCycleOff, Event::PsPowerOkDeassert) => {
                self.wheel.cancel(TimerId::GracefulPowerOff);
                self.enter(PowerState::CycleOff);
                self.wheel.arm(TimerId::PowerCycle, POWER_CYCLE_OFF);
            }
            (PowerState::GracefulTransitionToCycleOff, Event::GracefulPowerOffTimerExpired) => {
                self.enter(PowerState::On);
            }

            _ => tracing::trace!("no action for {:?} in {:?}", event, self.state),
        }
        if self.state != from {
            tracing::info!(
                target: "console",
                "host power state: {:?} -> {:?} on {:?}",
                from,
                self.state,
                event
            );
        }
    }

    fn enter(&mut self, state: PowerState) {
        self.state = state;
        self.surface
            .set_power_state(state.host_state(), state.chassis_state());
    }

    /// Emits the Redfish DC-power-on record, at most once per boot.
    pub(crate) fn log_dc_power_on(&mut self) {
        if !self.ac_loss_record_pending {
            return;
        }
        self.ac_loss_record_pending = false;
        tracing::info!(
            target: "console",
            redfish_message_id = "OpenBMC.0.1.DCPowerOnAfterACLost",
            "Power restored after AC power loss"
        );
    }

    async fn timer_expired(&mut self, id: TimerId) {
        match id {
            TimerId::GpioAssert => self.finish_pulse().await,
            TimerId::PowerCycle => self.dispatch(Event::PowerCycleTimerExpired).await,
            TimerId::GracefulPowerOff => self.dispatch(Event::GracefulPowerOffTimerExpired).await,
            TimerId::PsPowerOkWatchdog => {
                self.dispatch(Event::PsPowerOkWatchdogTimerExpired).await
            }
            TimerId::SioPowerGoodWatchdog => {
                self.dispatch(Event::SioPowerGoodWatchdogTimerExpired).await
            }
            TimerId::PowerRestorePolicy => self.restore_policy_expired().await,
        }
    }

    /// Asserts `line` low and arms the release timer.
    async fn pulse(&mut self, line: Line, duration: Duration) {
        self.start_pulse(line, duration, false).await;
    }

    /// Holds `POWER_OUT` low long enough to trigger the PCH hardware force
    /// off. If the release timer expires without `PS_PWROK` dropping first,
    /// the platform path has failed and the I²C power-down is issued.
    async fn force_power_off(&mut self) {
        self.start_pulse(gpio::POWER_OUT, FORCE_OFF_PULSE, true).await;
    }

    async fn start_pulse(&mut self, line: Line, duration: Duration, powerdown_fallback: bool) {
        // Only one assert timer exists; release any pulse still in flight.
        self.cancel_gpio_assert().await;
        if let Err(err) = self.gpio.drive(line, 0).await {
            tracing::error!(target: "console", "cannot assert `{}`: {}", line.name, err);
            if line.name == gpio::POWER_OUT.name {
                // The power sequencing path is gone; fall back to the
                // unconditional power-down.
                self.pch_power_down();
            }
            return;
        }
        self.active_pulse = Some(Pulse {
            line,
            powerdown_fallback,
        });
        self.wheel.arm(TimerId::GpioAssert, duration);
    }

    /// Cancels the assert timer, driving the pulsed line back to its inactive
    /// level before releasing it.
    async fn cancel_gpio_assert(&mut self) {
        self.wheel.cancel(TimerId::GpioAssert);
        if let Some(pulse) = self.active_pulse.take() {
            if let Err(err) = self.gpio.drive(pulse.line, 1).await {
                tracing::error!("cannot release `{}`: {}", pulse.line.name, err);
            }
            self.gpio.release(pulse.line);
        }
    }

    async fn finish_pulse(&mut self) {
        let Some(pulse) = self.active_pulse.take() else {
            return;
        };
        if let Err(err) = self.gpio.drive(pulse.line, 1).await {
            tracing::error!("cannot release `{}`: {}", pulse.line.name, err);
        }
        self.gpio.release(pulse.line);
        if pulse.powerdown_fallback {
            tracing::error!(
                target: "console",
                "power override pulse had no effect, issuing the PCH unconditional power-down"
            );
            self.pch_power_down();
        }
    }

    fn pch_power_down(&self) {
        if let Err(err) = self
            .i2c
            .write_byte(PCH_BUS, PCH_ADDR, PCH_CMD_REG, PCH_POWER_DOWN_CMD)
        {
            // No further automatic recovery; an operator has to look at this.
            tracing::error!(target: "console", "PCH power-down command failed: {}", err);
        }
    }

    async fn restore_policy_expired(&mut self) {
        let Some(policy) = self.pending_restore.take() else {
            return;
        };
        match policy {
            RestorePolicy::AlwaysOn => self.dispatch(Event::PowerOnRequest).await,
            RestorePolicy::Restore => {
                if self.power_drop.read().await {
                    self.dispatch(Event::PowerOnRequest).await;
                } else {
                    tracing::info!(target: "console", "no power drop recorded, leaving the host off");
                }
            }
            RestorePolicy::AlwaysOff => {}
        }
    }

    async fn button_edge(&mut self, id: ButtonId, edge: Edge) {
        match edge {
            Edge::Falling => {
                tracing::info!(target: "console", "{} button pressed", id.name());
                self.surface.set_button_pressed(id, true);
                let masked = match id {
                    ButtonId::Power => self.gpio.is_masked(gpio::POWER_OUT),
                    ButtonId::Reset => self.gpio.is_masked(gpio::RESET_OUT),
                    ButtonId::Nmi => self.nmi_masked,
                    ButtonId::Id => false,
                };
                if masked {
                    tracing::info!("{} button is masked, press not acted on", id.name());
                    return;
                }
                // Only the power button feeds the sequencer; reset and NMI
                // presses are surfaced as properties only, and platform
                // resets go through the chassis transition request.
                if id == ButtonId::Power {
                    self.dispatch(Event::PowerButtonPressed).await;
                }
            }
            Edge::Rising => {
                tracing::info!("{} button released", id.name());
                self.surface.set_button_pressed(id, false);
            }
        }
    }

    async fn set_button_mask(&mut self, id: ButtonId, masked: bool) -> std::io::Result<()> {
        match id {
            ButtonId::Power => self.gpio.set_mask(gpio::POWER_OUT, masked).await?,
            ButtonId::Reset => self.gpio.set_mask(gpio::RESET_OUT, masked).await?,
            ButtonId::Nmi => self.nmi_masked = masked,
            // Rejected at the surface already.
            ButtonId::Id => {}
        }
        self.surface.set_button_masked(id, masked);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projections_partition_the_states() {
        use PowerState::*;

        for state in [
            On,
            TransitionToOff,
            GracefulTransitionToOff,
            TransitionToCycleOff,
            GracefulTransitionToCycleOff,
        ] {
            assert_eq!(state.host_state(), HostState::Running);
            assert_eq!(state.chassis_state(), ChassisPowerState::On);
        }
        for state in [
            Off,
            AcLossOff,
            WaitForPsPowerOk,
            WaitForSioPowerGood,
            FailedTransitionToOn,
            CycleOff,
        ] {
            assert_eq!(state.host_state(), HostState::Off);
            assert_eq!(state.chassis_state(), ChassisPowerState::Off);
        }
    }

    #[test]
    fn request_events_map_per_surface_contract() {
        use powerctl_sdk::state::{ChassisTransition, HostTransition};

        assert_eq!(Event::from(HostTransition::On), Event::PowerOnRequest);
        assert_eq!(Event::from(HostTransition::Off), Event::GracefulPowerOffRequest);
        assert_eq!(
            Event::from(HostTransition::Reboot),
            Event::GracefulPowerCycleRequest
        );
        assert_eq!(Event::from(ChassisTransition::On), Event::PowerOnRequest);
        assert_eq!(Event::from(ChassisTransition::Off), Event::PowerOffRequest);
        assert_eq!(
            Event::from(ChassisTransition::PowerCycle),
            Event::PowerCycleRequest
        );
        assert_eq!(Event::from(ChassisTransition::Reset), Event::ResetRequest);
    }
}
