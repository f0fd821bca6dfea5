//! State and transition vocabularies of the `powerctld` surface.
//!
//! The string forms mirror the `xyz.openbmc_project` names so existing
//! managers keep understanding the surface.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const HOST_PATH: &str = "/xyz/openbmc_project/state/host0";
pub const HOST_IFACE: &str = "xyz.openbmc_project.State.Host";
pub const CHASSIS_PATH: &str = "/xyz/openbmc_project/state/chassis0";
pub const CHASSIS_IFACE: &str = "xyz.openbmc_project.State.Chassis";
pub const OS_PATH: &str = "/xyz/openbmc_project/state/os";
pub const OS_IFACE: &str = "xyz.openbmc_project.State.OperatingSystem.Status";
pub const BUTTONS_IFACE: &str = "xyz.openbmc_project.Chassis.Buttons";
pub const RESTORE_IFACE: &str = "xyz.openbmc_project.Control.Power.RestorePolicy";

/// The coarse host state published as `CurrentHostState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostState {
    Running,
    Off,
}
impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "Running",
            Self::Off => "Off",
        };
        write!(f, "xyz.openbmc_project.State.Host.HostState.{name}")
    }
}

/// The coarse chassis state published as `CurrentPowerState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChassisPowerState {
    On,
    Off,
}
impl fmt::Display for ChassisPowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::On => "On",
            Self::Off => "Off",
        };
        write!(f, "xyz.openbmc_project.State.Chassis.PowerState.{name}")
    }
}

/// The `OperatingSystemState` property.
///
/// `Standby` while the host firmware signals POST complete, `Inactive`
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsState {
    Standby,
    Inactive,
}
impl fmt::Display for OsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standby => "Standby",
            Self::Inactive => "Inactive",
        })
    }
}

/// A `RequestedHostTransition` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostTransition {
    On,
    Off,
    Reboot,
}
impl fmt::Display for HostTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::On => "On",
            Self::Off => "Off",
            Self::Reboot => "Reboot",
        };
        write!(f, "xyz.openbmc_project.State.Host.Transition.{name}")
    }
}
impl FromStr for HostTransition {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("xyz.openbmc_project.State.Host.Transition.") {
            Some("On") => Ok(Self::On),
            Some("Off") => Ok(Self::Off),
            Some("Reboot") => Ok(Self::Reboot),
            _ => Err(ApiError::invalid_transition(s)),
        }
    }
}

/// A `RequestedPowerTransition` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChassisTransition {
    On,
    Off,
    PowerCycle,
    Reset,
}
impl fmt::Display for ChassisTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::On => "On",
            Self::Off => "Off",
            Self::PowerCycle => "PowerCycle",
            Self::Reset => "Reset",
        };
        write!(f, "xyz.openbmc_project.State.Chassis.Transition.{name}")
    }
}
impl FromStr for ChassisTransition {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("xyz.openbmc_project.State.Chassis.Transition.") {
            Some("On") => Ok(Self::On),
            Some("Off") => Ok(Self::Off),
            Some("PowerCycle") => Ok(Self::PowerCycle),
            Some("Reset") => Ok(Self::Reset),
            _ => Err(ApiError::invalid_transition(s)),
        }
    }
}

/// The power restore policy applied after an AC loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestorePolicy {
    AlwaysOn,
    Restore,
    AlwaysOff,
}
impl fmt::Display for RestorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlwaysOn => "AlwaysOn",
            Self::Restore => "Restore",
            Self::AlwaysOff => "AlwaysOff",
        };
        write!(f, "xyz.openbmc_project.Control.Power.RestorePolicy.Policy.{name}")
    }
}
impl FromStr for RestorePolicy {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("xyz.openbmc_project.Control.Power.RestorePolicy.Policy.") {
            Some("AlwaysOn") => Ok(Self::AlwaysOn),
            Some("Restore") => Ok(Self::Restore),
            Some("AlwaysOff") => Ok(Self::AlwaysOff),
            _ => Err(ApiError::invalid_params(format!(
                "unknown power restore policy `{s}`"
            ))),
        }
    }
}

/// A front-panel button known to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonId {
    Power,
    Reset,
    Nmi,
    Id,
}
impl ButtonId {
    pub const ALL: [Self; 4] = [Self::Power, Self::Reset, Self::Nmi, Self::Id];

    pub fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Reset => "reset",
            Self::Nmi => "nmi",
            Self::Id => "id",
        }
    }

    pub fn path(self) -> String {
        format!("/xyz/openbmc_project/chassis/buttons/{}", self.name())
    }
}
impl FromStr for ButtonId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power" => Ok(Self::Power),
            "reset" => Ok(Self::Reset),
            "nmi" => Ok(Self::Nmi),
            "id" => Ok(Self::Id),
            _ => Err(ApiError::no_such_object(s)),
        }
    }
}

/// Result of `host.query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHost {
    pub current_host_state: HostState,
    pub requested_host_transition: Option<HostTransition>,
}

/// Result of `chassis.query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryChassis {
    pub current_power_state: ChassisPowerState,
    pub requested_power_transition: Option<ChassisTransition>,
}

/// Result of `os.query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOs {
    pub operating_system_state: OsState,
}

/// Result of `buttons.query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryButton {
    pub pressed: bool,
    pub masked: bool,
}

/// Result of `settings.query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    pub power_restore_policy: Option<RestorePolicy>,
    pub power_restore_delay: Option<u16>,
}

/// A signal pushed to subscribed sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "signal", content = "payload")]
pub enum Signal {
    PropertyChanged(PropertyChanged),
}

/// A property-change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyChanged {
    pub path: String,
    pub interface: String,
    pub property: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_names() {
        assert_eq!(
            "xyz.openbmc_project.State.Host.Transition.Reboot"
                .parse::<HostTransition>()
                .unwrap(),
            HostTransition::Reboot
        );
        assert_eq!(
            "xyz.openbmc_project.State.Chassis.Transition.PowerCycle"
                .parse::<ChassisTransition>()
                .unwrap(),
            ChassisTransition::PowerCycle
        );
        assert_eq!(
            HostTransition::Off.to_string(),
            "xyz.openbmc_project.State.Host.Transition.Off"
        );
    }

    #[test]
    fn unknown_transition_is_rejected() {
        let err = "xyz.openbmc_project.State.Host.Transition.Hibernate"
            .parse::<HostTransition>()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition { .. }));

        // A chassis target is not a host target.
        assert!("xyz.openbmc_project.State.Chassis.Transition.Off"
            .parse::<HostTransition>()
            .is_err());
    }

    #[test]
    fn button_names() {
        for id in ButtonId::ALL {
            assert_eq!(id.name().parse::<ButtonId>().unwrap(), id);
        }
        assert_eq!(
            ButtonId::Nmi.path(),
            "/xyz/openbmc_project/chassis/buttons/nmi"
        );
        assert!("identify".parse::<ButtonId>().is_err());
    }

    #[test]
    fn restore_policy_names() {
        assert_eq!(
            "xyz.openbmc_project.Control.Power.RestorePolicy.Policy.Restore"
                .parse::<RestorePolicy>()
                .unwrap(),
            RestorePolicy::Restore
        );
        assert!("Restore".parse::<RestorePolicy>().is_err());
    }
}
