//! The property cache of the external surface.
//!
//! Every value published here is a pure projection of the core's state; the
//! cache exists so queries answer without a round-trip through the state
//! machine, and so each change can be broadcast as a property-change signal.

use crate::events;
use ahash::AHashMap;
use powerctl_sdk::state::{
    ButtonId, ChassisPowerState, ChassisTransition, HostState, HostTransition, OsState,
    PropertyChanged, QueryButton, QueryChassis, QueryHost, QueryOs, QuerySettings, RestorePolicy,
    Signal, CHASSIS_IFACE, CHASSIS_PATH, HOST_IFACE, HOST_PATH, OS_IFACE, OS_PATH, BUTTONS_IFACE,
    RESTORE_IFACE,
};
use std::sync::RwLock;

#[derive(Debug, Default, Clone, Copy)]
struct ButtonState {
    pressed: bool,
    masked: bool,
}

#[derive(Debug)]
struct State {
    host_state: HostState,
    chassis_state: ChassisPowerState,
    os_state: OsState,
    requested_host_transition: Option<HostTransition>,
    requested_power_transition: Option<ChassisTransition>,
    buttons: AHashMap<ButtonId, ButtonState>,
    power_restore_policy: Option<RestorePolicy>,
    power_restore_delay: Option<u16>,
}

/// The surface property cache together with its signal bus.
#[derive(Debug)]
pub struct Surface {
    state: RwLock<State>,
    bus: events::Bus,
}
impl Surface {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                host_state: HostState::Off,
                chassis_state: ChassisPowerState::Off,
                os_state: OsState::Inactive,
                requested_host_transition: None,
                requested_power_transition: None,
                buttons: ButtonId::ALL
                    .iter()
                    .map(|&id| (id, ButtonState::default()))
                    .collect(),
                power_restore_policy: None,
                power_restore_delay: None,
            }),
            bus: events::Bus::new(),
        }
    }

    /// Subscribes to property-change signals.
    pub fn subscribe(&self) -> async_broadcast::Receiver<Signal> {
        self.bus.subscribe()
    }

    fn publish(&self, path: &str, interface: &str, property: &str, value: String) {
        tracing::debug!("{path} {property}: {value}");
        self.bus.trigger(Signal::PropertyChanged(PropertyChanged {
            path: path.into(),
            interface: interface.into(),
            property: property.into(),
            value,
        }));
    }

    /// Publishes the host and chassis projections of the power state.
    pub fn set_power_state(&self, host: HostState, chassis: ChassisPowerState) {
        let (host_changed, chassis_changed) = {
            let mut state = self.state.write().unwrap();
            let changed = (state.host_state != host, state.chassis_state != chassis);
            state.host_state = host;
            state.chassis_state = chassis;
            changed
        };
        if host_changed {
            self.publish(HOST_PATH, HOST_IFACE, "CurrentHostState", host.to_string());
        }
        if chassis_changed {
            self.publish(
                CHASSIS_PATH,
                CHASSIS_IFACE,
                "CurrentPowerState",
                chassis.to_string(),
            );
        }
    }

    pub fn set_os_state(&self, os: OsState) {
        let mut state = self.state.write().unwrap();
        if state.os_state == os {
            return;
        }
        state.os_state = os;
        drop(state);
        self.publish(OS_PATH, OS_IFACE, "OperatingSystemState", os.to_string());
    }

    pub fn set_button_pressed(&self, id: ButtonId, pressed: bool) {
        let mut state = self.state.write().unwrap();
        let entry = state.buttons.entry(id).or_default();
        if entry.pressed == pressed {
            return;
        }
        entry.pressed = pressed;
        drop(state);
        self.publish(&id.path(), BUTTONS_IFACE, "ButtonPressed", pressed.to_string());
    }

    pub fn set_button_masked(&self, id: ButtonId, masked: bool) {
        let mut state = self.state.write().unwrap();
        let entry = state.buttons.entry(id).or_default();
        if entry.masked == masked {
            return;
        }
        entry.masked = masked;
        drop(state);
        self.publish(&id.path(), BUTTONS_IFACE, "ButtonMasked", masked.to_string());
    }

    pub fn set_requested_host_transition(&self, transition: HostTransition) {
        self.state.write().unwrap().requested_host_transition = Some(transition);
        self.publish(
            HOST_PATH,
            HOST_IFACE,
            "RequestedHostTransition",
            transition.to_string(),
        );
    }

    pub fn set_requested_power_transition(&self, transition: ChassisTransition) {
        self.state.write().unwrap().requested_power_transition = Some(transition);
        self.publish(
            CHASSIS_PATH,
            CHASSIS_IFACE,
            "RequestedPowerTransition",
            transition.to_string(),
        );
    }

    pub fn set_restore_policy(&self, policy: RestorePolicy) {
        self.state.write().unwrap().power_restore_policy = Some(policy);
        self.publish(
            CHASSIS_PATH,
            RESTORE_IFACE,
            "PowerRestorePolicy",
            policy.to_string(),
        );
    }

    pub fn set_restore_delay(&self, delay: u16) {
        self.state.write().unwrap().power_restore_delay = Some(delay);
        self.publish(
            CHASSIS_PATH,
            RESTORE_IFACE,
            "PowerRestoreDelay",
            delay.to_string(),
        );
    }

    /// Returns the power restore settings as currently published.
    pub fn restore_settings(&self) -> (Option<RestorePolicy>, Option<u16>) {
        let state = self.state.read().unwrap();
        (state.power_restore_policy, state.power_restore_delay)
    }

    pub fn is_button_masked(&self, id: ButtonId) -> bool {
        self.state
            .read()
            .unwrap()
            .buttons
            .get(&id)
            .map(|b| b.masked)
            .unwrap_or(false)
    }

    pub fn query_host(&self) -> QueryHost {
        let state = self.state.read().unwrap();
        QueryHost {
            current_host_state: state.host_state,
            requested_host_transition: state.requested_host_transition,
        }
    }

    pub fn query_chassis(&self) -> QueryChassis {
        let state = self.state.read().unwrap();
        QueryChassis {
            current_power_state: state.chassis_state,
            requested_power_transition: state.requested_power_transition,
        }
    }

    pub fn query_os(&self) -> QueryOs {
        QueryOs {
            operating_system_state: self.state.read().unwrap().os_state,
        }
    }

    pub fn query_button(&self, id: ButtonId) -> QueryButton {
        let state = self.state.read().unwrap();
        let button = state.buttons.get(&id).copied().unwrap_or_default();
        QueryButton {
            pressed: button.pressed,
            masked: button.masked,
        }
    }

    pub fn query_settings(&self) -> QuerySettings {
        let state = self.state.read().unwrap();
        QuerySettings {
            power_restore_policy: state.power_restore_policy,
            power_restore_delay: state.power_restore_delay,
        }
    }
}
impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}
